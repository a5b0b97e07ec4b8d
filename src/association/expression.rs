//! # Schedule Expressions
//!
//! Parses association schedule expressions of the form `cron(...)` and
//! `rate(N unit)`, and computes the next run time.
//!
//! Cron bodies accept five classic fields (`min hour dom month dow`) or six
//! fields with a trailing year. `?` is accepted as a synonym for `*`.
//! Rates accept `minute(s)`, `hour(s)` and `day(s)`.

use super::collaborators::ExpressionEvaluator;
use super::model::InstanceAssociation;
use crate::error::{AgentError, AgentResult};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum ScheduleExpression {
    Cron {
        expression: String,
        schedule: cron::Schedule,
    },
    Rate {
        expression: String,
        interval: Duration,
    },
}

impl ScheduleExpression {
    pub fn parse(expression: &str) -> AgentResult<Self> {
        let trimmed = expression.trim();

        if let Some(body) = strip_wrapper(trimmed, "cron") {
            return parse_cron(trimmed, body);
        }
        if let Some(body) = strip_wrapper(trimmed, "rate") {
            return parse_rate(trimmed, body);
        }

        Err(AgentError::invalid_expression(
            expression,
            "expected cron(...) or rate(...)",
        ))
    }

    pub fn expression(&self) -> &str {
        match self {
            Self::Cron { expression, .. } | Self::Rate { expression, .. } => expression,
        }
    }

    /// Next run strictly after `after`; rates are anchored on the last execution
    pub fn next_run(
        &self,
        after: DateTime<Utc>,
        last_execution: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        match self {
            Self::Cron { schedule, .. } => schedule.after(&after).next(),
            Self::Rate { interval, .. } => {
                let interval = chrono::Duration::from_std(*interval).ok()?;
                match last_execution {
                    Some(last) if last + interval > after => Some(last + interval),
                    _ => Some(after),
                }
            }
        }
    }
}

fn strip_wrapper<'a>(expression: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = expression.strip_prefix(keyword)?;
    rest.trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

fn parse_cron(expression: &str, body: &str) -> AgentResult<ScheduleExpression> {
    let fields: Vec<&str> = body.split_whitespace().collect();
    if !(5..=6).contains(&fields.len()) {
        return Err(AgentError::invalid_expression(
            expression,
            format!("cron expects 5 or 6 fields, found {}", fields.len()),
        ));
    }

    let normalized = fields
        .iter()
        .map(|field| if *field == "?" { "*" } else { field })
        .collect::<Vec<_>>()
        .join(" ");

    // The cron crate wants a leading seconds field
    let schedule = cron::Schedule::from_str(&format!("0 {normalized}"))
        .map_err(|e| AgentError::invalid_expression(expression, e.to_string()))?;

    Ok(ScheduleExpression::Cron {
        expression: expression.to_string(),
        schedule,
    })
}

fn parse_rate(expression: &str, body: &str) -> AgentResult<ScheduleExpression> {
    let mut parts = body.split_whitespace();
    let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AgentError::invalid_expression(
            expression,
            "rate expects a value and a unit",
        ));
    };

    let value: u64 = value
        .parse()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| AgentError::invalid_expression(expression, "rate value must be a positive integer"))?;

    let unit_seconds = match unit {
        "minute" | "minutes" => 60,
        "hour" | "hours" => 60 * 60,
        "day" | "days" => 24 * 60 * 60,
        other => {
            return Err(AgentError::invalid_expression(
                expression,
                format!("unsupported rate unit '{other}'"),
            ))
        }
    };

    Ok(ScheduleExpression::Rate {
        expression: expression.to_string(),
        interval: Duration::from_secs(value * unit_seconds),
    })
}

/// [`ExpressionEvaluator`] backed by [`ScheduleExpression`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ScheduleExpressionEvaluator;

impl ExpressionEvaluator for ScheduleExpressionEvaluator {
    fn parse(&self, association: &mut InstanceAssociation) -> AgentResult<()> {
        let raw = association
            .schedule_expression()
            .ok_or(AgentError::MissingField {
                field: "schedule_expression",
            })?;
        let expression = ScheduleExpression::parse(raw)?;

        let next_run = expression.next_run(Utc::now(), association.association.last_execution_date);
        debug!(
            association_id = %association.display_id(),
            expression = %expression.expression(),
            next_run = ?next_run,
            "Parsed association schedule expression"
        );

        association.next_run = next_run;
        association.expression = Some(expression);
        Ok(())
    }
}
