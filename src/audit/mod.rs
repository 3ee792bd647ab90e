//! Audit Logging Module
//!
//! This module defines the audit record persisted for every inspected
//! transaction, the formatter capability that turns a record into bytes, and
//! the writer capability that stores it. The concurrent writer shards records
//! into one file per transaction under time-bucketed directories.

pub mod concurrent;
pub mod formatter;
pub mod path;
pub mod writer;

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub use concurrent::ConcurrentWriter;
pub use formatter::{AuditFormat, Formatter, JsonFormatter};
pub use writer::{spawn_write, Writer, WriterConfig};

/// Header map: header name to every value received for it
pub type Headers = BTreeMap<String, Vec<String>>;

/// Human-readable transaction timestamp layout
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

fn is_zero(port: &u16) -> bool {
    *port == 0
}

/// Rule severity, highest first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    #[default]
    Notice,
    Info,
    Debug,
}

/// Audit record for a single transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLog {
    pub transaction: Transaction,

    /// Messages from rules that matched during inspection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// Transaction summary: identity, timing, endpoints and the request/response pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Local time the transaction was created, `YYYY/MM/DD HH:MM:SS`
    #[serde(default)]
    pub timestamp: String,

    /// Creation instant in nanoseconds since the Unix epoch
    pub unix_timestamp: i64,

    /// Transaction identifier, also the record's file name suffix
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_ip: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub client_port: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host_ip: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub host_port: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<TransactionRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<TransactionResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<TransactionProducer>,
}

/// Request summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TransactionRequest {
    pub method: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,

    pub uri: String,

    pub http_version: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: Headers,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// Response summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TransactionResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,

    pub status: u16,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: Headers,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// Engine that produced the record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TransactionProducer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connector: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Rule engine mode (On, Off, DetectionOnly)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rule_engine: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stopwatch: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rulesets: Vec<String>,
}

/// A matched rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Message {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub actionset: String,

    pub message: String,

    pub data: MessageData,
}

/// Metadata of the rule behind a [`Message`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MessageData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,

    #[serde(default)]
    pub line: usize,

    pub id: u64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rev: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ver: String,

    #[serde(default)]
    pub maturity: u8,

    #[serde(default)]
    pub accuracy: u8,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AuditLog {
    /// Create a record for `id` stamped with the current time
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::at(id, now)
    }

    /// Create a record for `id` created at `unix_nanos`
    pub fn at(id: impl Into<String>, unix_nanos: i64) -> Self {
        Self {
            transaction: Transaction {
                timestamp: path::local_time(unix_nanos)
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
                unix_timestamp: unix_nanos,
                id: id.into(),
                client_ip: String::new(),
                client_port: 0,
                host_ip: String::new(),
                host_port: 0,
                server_id: String::new(),
                request: None,
                response: None,
                producer: None,
            },
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.transaction.id
    }

    pub fn unix_timestamp(&self) -> i64 {
        self.transaction.unix_timestamp
    }

    /// Set client address
    pub fn with_client(mut self, ip: impl Into<String>, port: u16) -> Self {
        self.transaction.client_ip = ip.into();
        self.transaction.client_port = port;
        self
    }

    /// Set the address the request was received on
    pub fn with_host(mut self, ip: impl Into<String>, port: u16) -> Self {
        self.transaction.host_ip = ip.into();
        self.transaction.host_port = port;
        self
    }

    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.transaction.server_id = server_id.into();
        self
    }

    /// Set request summary
    pub fn with_request(mut self, request: TransactionRequest) -> Self {
        self.transaction.request = Some(request);
        self
    }

    /// Set response summary
    pub fn with_response(mut self, response: TransactionResponse) -> Self {
        self.transaction.response = Some(response);
        self
    }

    pub fn with_producer(mut self, producer: TransactionProducer) -> Self {
        self.transaction.producer = Some(producer);
        self
    }

    /// Append a matched rule message
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
}

impl TransactionRequest {
    pub fn new(
        method: impl Into<String>,
        uri: impl Into<String>,
        http_version: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            http_version: http_version.into(),
            ..Default::default()
        }
    }

    /// Add one header value; repeated names accumulate
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

impl TransactionResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Add one header value; repeated names accumulate
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

impl Message {
    pub fn new(rule_id: u64, message: impl Into<String>, severity: Severity) -> Self {
        let message = message.into();
        Self {
            actionset: String::new(),
            data: MessageData {
                id: rule_id,
                msg: message.clone(),
                severity,
                ..Default::default()
            },
            message,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.data.tags = tags;
        self
    }
}
