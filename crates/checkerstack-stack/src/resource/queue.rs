//! Task queue declarations.

use checkerstack_common::types::LogicalId;
use serde::Serialize;

use crate::intrinsic::Value;

/// Message lifecycle actions the handler needs on the queue.
pub const QUEUE_CONSUMER_ACTIONS: &[&str] = &[
    "sqs:ChangeMessageVisibility",
    "sqs:DeleteMessage",
    "sqs:GetQueueAttributes",
    "sqs:GetQueueUrl",
    "sqs:ReceiveMessage",
    "sqs:SendMessage",
];

/// `AWS::SQS::Queue` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueProps {
    /// Physical queue name.
    pub queue_name: Value,
}

impl QueueProps {
    /// Standard queue with a fixed name.
    #[must_use]
    pub const fn named(queue_name: Value) -> Self {
        Self { queue_name }
    }
}

/// URL of the queue. `Ref` on a queue resolves to its URL.
#[must_use]
pub fn queue_url(queue: &LogicalId) -> Value {
    Value::reference(queue)
}

/// ARN of the queue.
#[must_use]
pub fn queue_arn(queue: &LogicalId) -> Value {
    Value::get_att(queue, "Arn")
}
