//! Operation interceptor.
//!
//! Every public query-executing call runs inside an [`Operation`]. With
//! logging enabled the operation is logged on entry with a timestamp, its
//! qualified name and its arguments. Failures are always logged with the
//! qualified name, then returned unchanged.

use crate::error::OrmResult;
use chrono::Utc;
use std::fmt::{Debug, Write};
use std::future::Future;
use tracing::{error, info};

/// Capability describing one intercepted call.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    args: String,
    logging: bool,
}

impl Operation {
    /// `scope` is the owning component (`Orm`, or a table name for models).
    pub fn new(scope: &str, operation: &str, logging: bool) -> Self {
        Self {
            name: format!("{}::{}", scope, operation),
            args: String::new(),
            logging,
        }
    }

    /// Record an argument. Formatting is skipped when logging is off.
    pub fn arg(mut self, name: &str, value: &impl Debug) -> Self {
        if self.logging {
            if !self.args.is_empty() {
                self.args.push_str(", ");
            }
            let _ = write!(self.args, "{}={:?}", name, value);
        }
        self
    }

    /// Fully-qualified operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    /// Run `fut` under this operation.
    pub async fn run<T, F>(self, fut: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>>,
    {
        if self.logging {
            info!(
                at = %Utc::now().to_rfc3339(),
                operation = %self.name,
                args = %self.args,
                "Executing operation"
            );
        }

        match fut.await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!(operation = %self.name, error = %e, "Operation failed");
                Err(e)
            }
        }
    }
}
