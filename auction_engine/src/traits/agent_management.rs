use std::future::Future;

use crate::{
    db_types::{Agent, NewAgent},
    traits::AuctionDbError,
};

pub trait AgentManagement {
    fn fetch_agent_by_name(&self, name: &str) -> impl Future<Output = Result<Option<Agent>, AuctionDbError>> + Send;

    /// Stores a new agent. Agent names are unique; if an agent with the same name exists,
    /// [`AuctionDbError::AgentAlreadyExists`] is returned.
    fn insert_agent(&self, agent: NewAgent) -> impl Future<Output = Result<Agent, AuctionDbError>> + Send;
}
