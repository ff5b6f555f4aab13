use std::sync::Mutex;

use async_trait::async_trait;

use crate::mqtt::{Ack, CommandPublisher, DeliveryOptions, PublishError};

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub options: DeliveryOptions,
}

/// In-memory publisher that records every call and optionally fails them all
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Published>>,
    attempts: Mutex<usize>,
    failure: Option<PublishError>,
}

impl RecordingPublisher {
    pub fn failing(err: PublishError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl CommandPublisher for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        options: DeliveryOptions,
    ) -> Result<Ack, PublishError> {
        *self.attempts.lock().unwrap() += 1;

        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        self.published.lock().unwrap().push(Published {
            topic: topic.to_string(),
            payload: payload.to_string(),
            options,
        });
        Ok(Ack::new(topic, payload))
    }
}
