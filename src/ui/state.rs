use chrono::{DateTime, Utc};
use std::collections::VecDeque;

const MAX_LOG_MESSAGES: usize = 100;

/// What the status bar reports
#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Idle,
    Loading { operation: String, pending: usize },
    Error { message: String },
    Success { message: String },
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Log message with timestamp
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// In-flight counter plus the activity log shown at the bottom of the dashboard
#[derive(Debug)]
pub struct AsyncStateManager {
    pub current_state: AppState,
    pub pending_operations: usize,
    pub log_messages: VecDeque<LogMessage>,
}

impl Default for AsyncStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncStateManager {
    pub fn new() -> Self {
        Self {
            current_state: AppState::Idle,
            pending_operations: 0,
            log_messages: VecDeque::with_capacity(MAX_LOG_MESSAGES),
        }
    }

    pub fn start_operation(&mut self, operation: &str) {
        self.pending_operations += 1;
        self.current_state = AppState::Loading {
            operation: operation.to_string(),
            pending: self.pending_operations,
        };
    }

    /// Finish one in-flight request. Notices that arrive for stale views still count down.
    pub fn complete_operation(&mut self, operation: &str, result: Result<Option<String>, String>) {
        self.pending_operations = self.pending_operations.saturating_sub(1);
        match result {
            Ok(Some(message)) => {
                self.add_log_message(LogLevel::Success, &message);
                self.current_state = AppState::Success { message };
            }
            Ok(None) => {
                if self.pending_operations == 0 {
                    self.current_state = AppState::Idle;
                }
            }
            Err(message) => {
                self.add_log_message(LogLevel::Error, &message);
                self.current_state = AppState::Error { message };
            }
        }
        if self.pending_operations == 0 {
            if let AppState::Loading { .. } = self.current_state {
                self.current_state = AppState::Idle;
            }
        } else if let AppState::Idle = self.current_state {
            self.current_state = AppState::Loading {
                operation: operation.to_string(),
                pending: self.pending_operations,
            };
        }
    }

    pub fn add_log_message(&mut self, level: LogLevel, message: &str) {
        self.log_messages.push_back(LogMessage {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
        });

        while self.log_messages.len() > MAX_LOG_MESSAGES {
            self.log_messages.pop_front();
        }
    }

    /// Surface a notice without touching the in-flight count
    pub fn notify(&mut self, level: LogLevel, message: &str) {
        self.add_log_message(level, message);
        self.current_state = match level {
            LogLevel::Error | LogLevel::Warning => AppState::Error {
                message: message.to_string(),
            },
            _ => AppState::Success {
                message: message.to_string(),
            },
        };
    }

    /// Get the current status text for display
    pub fn get_status_text(&self) -> String {
        match &self.current_state {
            AppState::Idle => "Ready".to_string(),
            AppState::Loading { operation, pending } if *pending > 1 => {
                format!("{}... ({} requests in flight)", operation, pending)
            }
            AppState::Loading { operation, .. } => format!("{}...", operation),
            AppState::Error { message } => format!("Error: {}", message),
            AppState::Success { message } => message.clone(),
        }
    }

    pub fn has_active_operations(&self) -> bool {
        self.pending_operations > 0
    }

    /// Get recent log messages (last N)
    pub fn get_recent_logs(&self, count: usize) -> Vec<&LogMessage> {
        let start = self.log_messages.len().saturating_sub(count);
        self.log_messages.iter().skip(start).collect()
    }
}
