//! Destination registration

use crate::destination::LogDestination;
use std::sync::Arc;

/// Parent that destination builders register their result with
pub trait DestinationsBuilder {
    fn custom_destination(&mut self, destination: Arc<dyn LogDestination>) -> &mut Self;
}

/// Ordered set of destinations belonging to one log group
#[derive(Default, Clone)]
pub struct LogGroupDestinations {
    destinations: Vec<Arc<dyn LogDestination>>,
}

impl LogGroupDestinations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destinations(&self) -> &[Arc<dyn LogDestination>] {
        &self.destinations
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn into_destinations(self) -> Vec<Arc<dyn LogDestination>> {
        self.destinations
    }
}

impl DestinationsBuilder for LogGroupDestinations {
    fn custom_destination(&mut self, destination: Arc<dyn LogDestination>) -> &mut Self {
        self.destinations.push(destination);
        self
    }
}
