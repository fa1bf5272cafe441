use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{
    AuctionClosedEvent,
    BidRefundedEvent,
    EventHandler,
    EventProducer,
    Handler,
    HighestBidEvent,
    NewBidEvent,
};

/// Producers handed to the engine APIs. Each event is sent to every producer in the matching list.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub new_bid_producer: Vec<EventProducer<NewBidEvent>>,
    pub highest_bid_producer: Vec<EventProducer<HighestBidEvent>>,
    pub bid_refunded_producer: Vec<EventProducer<BidRefundedEvent>>,
    pub auction_closed_producer: Vec<EventProducer<AuctionClosedEvent>>,
}

impl EventProducers {
    pub async fn publish_new_bid(&self, event: NewBidEvent) {
        for producer in &self.new_bid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_highest_bid(&self, event: HighestBidEvent) {
        for producer in &self.highest_bid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_bid_refunded(&self, event: BidRefundedEvent) {
        for producer in &self.bid_refunded_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_auction_closed(&self, event: AuctionClosedEvent) {
        for producer in &self.auction_closed_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_new_bid: Option<EventHandler<NewBidEvent>>,
    pub on_highest_bid: Option<EventHandler<HighestBidEvent>>,
    pub on_bid_refunded: Option<EventHandler<BidRefundedEvent>>,
    pub on_auction_closed: Option<EventHandler<AuctionClosedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_new_bid = hooks.on_new_bid.map(|f| EventHandler::new(buffer_size, f));
        let on_highest_bid = hooks.on_highest_bid.map(|f| EventHandler::new(buffer_size, f));
        let on_bid_refunded = hooks.on_bid_refunded.map(|f| EventHandler::new(buffer_size, f));
        let on_auction_closed = hooks.on_auction_closed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_new_bid, on_highest_bid, on_bid_refunded, on_auction_closed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_new_bid {
            result.new_bid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_highest_bid {
            result.highest_bid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_bid_refunded {
            result.bid_refunded_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_auction_closed {
            result.auction_closed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for every registered handler. Each task ends once all its producers have been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_new_bid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_highest_bid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_bid_refunded {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_auction_closed {
            tokio::spawn(handler.start_handler());
        }
        trace!("📬️ Event handlers started");
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_new_bid: Option<Handler<NewBidEvent>>,
    pub on_highest_bid: Option<Handler<HighestBidEvent>>,
    pub on_bid_refunded: Option<Handler<BidRefundedEvent>>,
    pub on_auction_closed: Option<Handler<AuctionClosedEvent>>,
}

impl EventHooks {
    pub fn on_new_bid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NewBidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_new_bid = Some(Arc::new(f));
        self
    }

    pub fn on_highest_bid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(HighestBidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_highest_bid = Some(Arc::new(f));
        self
    }

    pub fn on_bid_refunded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BidRefundedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_bid_refunded = Some(Arc::new(f));
        self
    }

    pub fn on_auction_closed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(AuctionClosedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_auction_closed = Some(Arc::new(f));
        self
    }
}
