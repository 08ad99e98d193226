use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Alert,
    Info,
    Prediction,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Alert => "alert",
            InsightKind::Info => "info",
            InsightKind::Prediction => "prediction",
        }
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert" => Ok(InsightKind::Alert),
            "info" => Ok(InsightKind::Info),
            "prediction" => Ok(InsightKind::Prediction),
            other => Err(format!("unknown insight kind: {}", other)),
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insight severity. Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived observation about recent conditions, as stored.
/// Insights are a historical record and are never updated or merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: i64,
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    /// `None` is treated as low / unclassified
    pub severity: Option<Severity>,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    pub fn effective_severity(&self) -> Severity {
        self.severity.unwrap_or(Severity::Low)
    }
}

/// Repository input for appending a derived insight
#[derive(Debug, Clone, PartialEq)]
pub struct AppendInsightRepoInput {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub severity: Option<Severity>,
    pub created_at: DateTime<Utc>,
}

/// Repository input for a recency-bounded read.
/// `limit: None` returns every stored insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecentInsightsRepoInput {
    pub limit: Option<usize>,
}

/// Repository trait for insight storage operations
/// Same ordering contract as `TelemetrySampleRepository::recent`
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InsightRepository: Send + Sync {
    /// Append an insight, assigning its identifier
    async fn append(&self, input: AppendInsightRepoInput) -> DomainResult<Insight>;

    /// Read up to `limit` insights, newest first
    async fn recent(&self, input: RecentInsightsRepoInput) -> DomainResult<Vec<Insight>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_stored_values() {
        for kind in [InsightKind::Alert, InsightKind::Info, InsightKind::Prediction] {
            assert_eq!(kind.as_str().parse::<InsightKind>(), Ok(kind));
        }
        assert!("warning".parse::<InsightKind>().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!("high".parse::<Severity>(), Ok(Severity::High));
    }

    #[test]
    fn test_missing_severity_counts_as_low() {
        let insight = Insight {
            id: 1,
            kind: InsightKind::Info,
            title: "24-Hour Summary".to_string(),
            description: String::new(),
            severity: None,
            created_at: Utc::now(),
        };
        assert_eq!(insight.effective_severity(), Severity::Low);
    }

    #[test]
    fn test_insight_serializes_lowercase_enums() {
        let insight = Insight {
            id: 7,
            kind: InsightKind::Alert,
            title: "Strong Wind Alert".to_string(),
            description: "Wind speeds averaging 45.0 km/h.".to_string(),
            severity: Some(Severity::High),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["kind"], "alert");
        assert_eq!(json["severity"], "high");
    }
}
