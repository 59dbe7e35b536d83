// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Descriptors for the metrics emitted by the Kafka metrics receiver.
//!
//! Every metric is a gauge. Lookups go through [`METRICS`], which is kept in
//! name order.

use serde::Serialize;

/// Component type name of the receiver.
pub const TYPE: &str = "kafkametricsreceiver";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Gauge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub data_type: DataType,
}

/// Attribute keys attached to the receiver's data points.
pub mod labels {
    /// ID (string) of a consumer group
    pub const GROUP: &str = "group";
    /// Number (integer) of the partition
    pub const PARTITION: &str = "partition";
    /// ID (integer) of a topic
    pub const TOPIC: &str = "topic";

    pub const ALL: [&str; 3] = [GROUP, PARTITION, TOPIC];
}

const fn gauge(
    name: &'static str,
    description: &'static str,
    unit: &'static str,
) -> MetricDescriptor {
    MetricDescriptor {
        name,
        description,
        unit,
        data_type: DataType::Gauge,
    }
}

pub const KAFKA_BROKERS: MetricDescriptor =
    gauge("kafka.brokers", "Number of brokers in the cluster.", "{brokers}");
pub const KAFKA_CONSUMER_GROUP_LAG: MetricDescriptor = gauge(
    "kafka.consumer_group.lag",
    "Current approximate lag of consumer group at partition of topic",
    "1",
);
pub const KAFKA_CONSUMER_GROUP_LAG_SUM: MetricDescriptor = gauge(
    "kafka.consumer_group.lag_sum",
    "Current approximate sum of consumer group lag across all partitions of topic",
    "1",
);
pub const KAFKA_CONSUMER_GROUP_MEMBERS: MetricDescriptor = gauge(
    "kafka.consumer_group.members",
    "Count of members in the consumer group",
    "{members}",
);
pub const KAFKA_CONSUMER_GROUP_OFFSET: MetricDescriptor = gauge(
    "kafka.consumer_group.offset",
    "Current offset of the consumer group at partition of topic",
    "1",
);
pub const KAFKA_CONSUMER_GROUP_OFFSET_SUM: MetricDescriptor = gauge(
    "kafka.consumer_group.offset_sum",
    "Sum of consumer group offset across partitions of topic",
    "1",
);
pub const KAFKA_PARTITION_CURRENT_OFFSET: MetricDescriptor = gauge(
    "kafka.partition.current_offset",
    "Current offset of partition of topic.",
    "1",
);
pub const KAFKA_PARTITION_OLDEST_OFFSET: MetricDescriptor = gauge(
    "kafka.partition.oldest_offset",
    "Oldest offset of partition of topic",
    "1",
);
pub const KAFKA_PARTITION_REPLICAS: MetricDescriptor = gauge(
    "kafka.partition.replicas",
    "Number of replicas for partition of topic",
    "{replicas}",
);
pub const KAFKA_PARTITION_REPLICAS_IN_SYNC: MetricDescriptor = gauge(
    "kafka.partition.replicas_in_sync",
    "Number of synchronized replicas of partition",
    "{replicas}",
);
pub const KAFKA_TOPIC_PARTITIONS: MetricDescriptor = gauge(
    "kafka.topic.partitions",
    "Number of partitions in topic.",
    "{partitions}",
);

pub static METRICS: [MetricDescriptor; 11] = [
    KAFKA_BROKERS,
    KAFKA_CONSUMER_GROUP_LAG,
    KAFKA_CONSUMER_GROUP_LAG_SUM,
    KAFKA_CONSUMER_GROUP_MEMBERS,
    KAFKA_CONSUMER_GROUP_OFFSET,
    KAFKA_CONSUMER_GROUP_OFFSET_SUM,
    KAFKA_PARTITION_CURRENT_OFFSET,
    KAFKA_PARTITION_OLDEST_OFFSET,
    KAFKA_PARTITION_REPLICAS,
    KAFKA_PARTITION_REPLICAS_IN_SYNC,
    KAFKA_TOPIC_PARTITIONS,
];

#[must_use]
pub fn names() -> Vec<&'static str> {
    METRICS.iter().map(|m| m.name).collect()
}

#[must_use]
pub fn by_name(name: &str) -> Option<&'static MetricDescriptor> {
    METRICS
        .binary_search_by(|m| m.name.cmp(name))
        .ok()
        .map(|i| &METRICS[i])
}
