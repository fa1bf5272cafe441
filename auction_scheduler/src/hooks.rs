use auction_engine::events::{
    AuctionClosedEvent,
    BidRefundedEvent,
    EventHandlers,
    EventHooks,
    HighestBidEvent,
    NewBidEvent,
};
use futures::future::BoxFuture;
use log::*;

/// Event hooks that write every auction event to the log.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_new_bid(|ev| {
            let NewBidEvent { bid, receipt } = ev;
            info!("📬️ New bid {bid} announced on topic {} as message #{}", receipt.topic_id, receipt.sequence_number);
            no_op()
        })
        .on_highest_bid(|ev| {
            let HighestBidEvent { bid, previous } = ev;
            match previous {
                Some(prev) => info!("📬️ Bid {bid} displaced bid #{} ({}) for post {}", prev.id, prev.amount, bid.post_id),
                None => info!("📬️ Bid {bid} is the first leading bid for post {}", bid.post_id),
            }
            no_op()
        })
        .on_bid_refunded(|ev| {
            let BidRefundedEvent { bid, transfer } = ev;
            info!(
                "📬️ {} refunded to {} for bid #{}. Transfer id: {}",
                bid.amount, bid.bidder_account, bid.id, transfer.transfer_id
            );
            no_op()
        })
        .on_auction_closed(|ev| {
            let AuctionClosedEvent { post_id, closed_at, winner } = ev;
            match winner {
                Some(bid) => info!("📬️ Auction for post {post_id} closed at {closed_at}. {} won with bid {bid}", bid.bidder_id),
                None => info!("📬️ Auction for post {post_id} closed at {closed_at} without a winner"),
            }
            no_op()
        });
    hooks
}

pub fn create_event_handlers(buffer_size: usize) -> EventHandlers {
    EventHandlers::new(buffer_size, logging_hooks())
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
