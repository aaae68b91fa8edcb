//! Aggregate statistics shown on the dashboard.
//!
//! The figures are produced elsewhere (the analytics pipeline of the chatbot
//! deployment); this module only carries them and derives the labelled shares
//! used by the response type pie chart.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub total_queries: u64,
    pub success_rate: f64,
    pub avg_response_time: f64,
    pub user_satisfaction: f64,
    pub daily_queries: Vec<DailyCount>,
    pub response_types: Vec<TypeCount>,
    pub top_documents: Vec<DocumentCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub response_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTypeShare {
    #[serde(rename = "type")]
    pub response_type: String,
    pub count: u64,
    pub percent: f64,
    pub label: String,
}

/// `count / total` as a percentage rounded to one decimal place.
pub fn percent_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

pub fn response_type_shares(counts: &[TypeCount]) -> Vec<ResponseTypeShare> {
    let total: u64 = counts.iter().map(|entry| entry.count).sum();
    counts
        .iter()
        .map(|entry| {
            let percent = percent_of(entry.count, total);
            ResponseTypeShare {
                response_type: entry.response_type.clone(),
                count: entry.count,
                percent,
                label: format!("{}: {:.1}%", entry.response_type, percent),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, u64)]) -> Vec<TypeCount> {
        entries
            .iter()
            .map(|(kind, count)| TypeCount {
                response_type: kind.to_string(),
                count: *count,
            })
            .collect()
    }

    #[test]
    fn shares_are_rounded_to_one_decimal() {
        let shares = response_type_shares(&counts(&[
            ("FAQ", 580),
            ("TermDefinition", 320),
            ("SmallTalk", 347),
        ]));

        let percents: Vec<f64> = shares.iter().map(|s| s.percent).collect();
        assert_eq!(percents, vec![46.5, 25.7, 27.8]);
        assert_eq!(shares[0].label, "FAQ: 46.5%");
        assert_eq!(shares[2].label, "SmallTalk: 27.8%");
    }

    #[test]
    fn zero_total_yields_zero_percent() {
        let shares = response_type_shares(&counts(&[("FAQ", 0)]));
        assert_eq!(shares[0].percent, 0.0);
        assert_eq!(shares[0].label, "FAQ: 0.0%");
        assert!(response_type_shares(&[]).is_empty());
    }
}
