//! Rule-based churn score from order silence, volume drop and client value

use crate::config::ChurnConfig;
use crate::model::{ChurnRisk, Client, ClientCategory, RiskLevel};
use chrono::NaiveDate;

/// Latest order date over all clients
pub fn latest_order_date(clients: &[Client]) -> Option<NaiveDate> {
    clients
        .iter()
        .flat_map(|c| c.rows.iter().filter_map(|r| r.date))
        .max()
}

fn level_for(score: f64, config: &ChurnConfig) -> Option<RiskLevel> {
    if score >= config.critical_threshold {
        Some(RiskLevel::Critical)
    } else if score >= config.high_threshold {
        Some(RiskLevel::High)
    } else if score >= config.monitor_threshold {
        Some(RiskLevel::Monitor)
    } else {
        None
    }
}

/// Score one client; `None` without at least two distinct order dates
pub fn score_client(client: &Client, as_of: NaiveDate, config: &ChurnConfig) -> Option<ChurnRisk> {
    let orders = client.order_history();
    if orders.len() < 2 {
        return None;
    }
    let (first_date, _) = orders[0];
    let (last_date, last_volume) = orders[orders.len() - 1];

    let avg_gap_days = (last_date - first_date).num_days() as f64 / (orders.len() - 1) as f64;
    let days_since_last_order = (as_of - last_date).num_days().max(0);
    let silence_ratio = if avg_gap_days > 0.0 {
        days_since_last_order as f64 / avg_gap_days
    } else {
        0.0
    };

    let previous = &orders[..orders.len() - 1];
    let previous_avg = previous.iter().map(|(_, v)| v).sum::<f64>() / previous.len() as f64;
    let volume_drop_pct = if previous_avg > 0.0 && last_volume < previous_avg {
        (previous_avg - last_volume) / previous_avg * 100.0
    } else {
        0.0
    };

    let mut score = 0.0;
    let mut factors = Vec::new();

    if silence_ratio > config.silence_ratio {
        score += config.silence_points;
        factors.push(format!(
            "No orders for {} days ({:.1}x the average {:.0}-day gap)",
            days_since_last_order, silence_ratio, avg_gap_days
        ));
    }
    if silence_ratio > config.extreme_silence_ratio {
        score += config.extreme_silence_points;
        factors.push(format!(
            "Silence exceeds {}x the usual order rhythm",
            config.extreme_silence_ratio
        ));
    }

    if volume_drop_pct >= config.severe_drop_pct {
        score += config.severe_drop_points;
        factors.push(format!("Last order {:.0}% below average", volume_drop_pct));
    } else if volume_drop_pct >= config.moderate_drop_pct {
        score += config.moderate_drop_points;
        factors.push(format!("Last order {:.0}% below average", volume_drop_pct));
    }

    match client.category {
        ClientCategory::A => {
            score += config.category_a_points;
            factors.push("Category A client".to_string());
        }
        ClientCategory::B => {
            score += config.category_b_points;
            factors.push("Category B client".to_string());
        }
        ClientCategory::C => {}
    }

    let score = f64::min(score, 100.0);
    let level = level_for(score, config)?;

    Some(ChurnRisk {
        client_key: client.key.clone(),
        client_name: client.display_name().to_string(),
        manager: client.manager.clone(),
        region: client.region().to_string(),
        category: client.category,
        days_since_last_order,
        avg_gap_days,
        silence_ratio,
        volume_drop_pct,
        score,
        level,
        factors,
    })
}

/// Churn risks at or above the Monitor threshold, highest score first.
///
/// `as_of` defaults to the latest order date in the data.
pub fn score_churn(clients: &[Client], as_of: Option<NaiveDate>, config: &ChurnConfig) -> Vec<ChurnRisk> {
    let Some(as_of) = as_of.or_else(|| latest_order_date(clients)) else {
        return Vec::new();
    };

    let mut risks: Vec<ChurnRisk> = clients
        .iter()
        .filter_map(|c| score_client(c, as_of, config))
        .collect();
    risks.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.client_name.cmp(&b.client_name))
    });
    log::debug!("{} clients at churn risk as of {}", risks.len(), as_of);
    risks
}
