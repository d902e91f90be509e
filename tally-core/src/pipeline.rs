//! Board view of the sales pipeline.
//!
//! Aggregation is a pure function over two lists (stages, deals) so it can be
//! exercised without a store.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CrmResult;
use crate::models::{DealView, PipelineStage};
use crate::money::sum_amounts;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineColumn {
    pub stage: PipelineStage,
    pub deals: Vec<DealView>,
    pub deal_count: usize,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineSummary {
    pub total_deals: usize,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub pipeline: Vec<PipelineColumn>,
    pub summary: PipelineSummary,
    /// Deals whose stage id matched no stage. Counted in `summary` only.
    #[serde(skip)]
    pub orphaned: Vec<Uuid>,
}

/// Groups `deals` under `stages`.
///
/// Every stage gets a column (empty ones included), in `position` order.
/// Deals keep their relative input order inside a column. The summary covers
/// every deal, including orphans that land in no column. Fails only when a
/// total does not fit in a `Decimal`.
pub fn group_pipeline(
    mut stages: Vec<PipelineStage>,
    deals: Vec<DealView>,
) -> CrmResult<Pipeline> {
    stages.sort_by_key(|stage| stage.position);

    let summary = PipelineSummary {
        total_deals: deals.len(),
        total_value: sum_amounts(deals.iter().map(|d| d.deal.value))?,
    };

    let mut by_stage: HashMap<Uuid, Vec<DealView>> = HashMap::new();
    let known: Vec<Uuid> = stages.iter().map(|s| s.id).collect();
    let mut orphaned = Vec::new();
    for deal in deals {
        if known.contains(&deal.deal.stage_id) {
            by_stage.entry(deal.deal.stage_id).or_default().push(deal);
        } else {
            orphaned.push(deal.deal.id);
        }
    }

    let pipeline = stages
        .into_iter()
        .map(|stage| {
            let deals = by_stage.remove(&stage.id).unwrap_or_default();
            let total_value = sum_amounts(deals.iter().map(|d| d.deal.value))?;
            Ok(PipelineColumn {
                deal_count: deals.len(),
                total_value,
                deals,
                stage,
            })
        })
        .collect::<CrmResult<Vec<_>>>()?;

    Ok(Pipeline {
        pipeline,
        summary,
        orphaned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Deal, PlanType};
    use chrono::Utc;
    use std::str::FromStr;

    fn stage(name: &str, position: i64) -> PipelineStage {
        PipelineStage {
            id: Uuid::new_v4(),
            name: name.to_string(),
            display_name: name.to_string(),
            color: "#000000".to_string(),
            position,
        }
    }

    fn deal(stage_id: Uuid, value: &str) -> DealView {
        let now = Utc::now();
        DealView {
            deal: Deal {
                id: Uuid::new_v4(),
                contact_id: None,
                stage_id,
                product_id: None,
                name: "deal".to_string(),
                value: Decimal::from_str(value).unwrap(),
                notes: None,
                expected_close: None,
                plan_type: PlanType::Managed,
                lead_source: None,
                closed_at: None,
                created_at: now,
                updated_at: now,
            },
            contact_name: None,
            contact_company: None,
            stage_name: None,
            stage_display_name: None,
            stage_color: None,
            product_name: None,
        }
    }

    #[test]
    fn columns_follow_position_not_input_order() {
        let stages = vec![stage("c", 3), stage("a", 1), stage("b", 2)];
        let board = group_pipeline(stages, vec![]).unwrap();
        let names: Vec<&str> = board.pipeline.iter().map(|c| c.stage.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_stages_are_kept_with_zero_totals() {
        let lead = stage("lead", 1);
        let won = stage("won", 2);
        let board = group_pipeline(vec![lead.clone(), won], vec![deal(lead.id, "10")]).unwrap();

        assert_eq!(board.pipeline[1].deal_count, 0);
        assert_eq!(board.pipeline[1].total_value, Decimal::ZERO);
        assert_eq!(board.pipeline[0].deal_count, 1);
    }

    #[test]
    fn totals_use_exact_decimal_arithmetic() {
        let lead = stage("lead", 1);
        let deals = vec![deal(lead.id, "0.1"), deal(lead.id, "0.2")];
        let board = group_pipeline(vec![lead], deals).unwrap();

        assert_eq!(board.pipeline[0].total_value, Decimal::from_str("0.3").unwrap());
        assert_eq!(board.summary.total_value, Decimal::from_str("0.3").unwrap());
    }

    #[test]
    fn column_totals_add_up_to_summary_without_orphans() {
        let a = stage("a", 1);
        let b = stage("b", 2);
        let deals = vec![deal(a.id, "100"), deal(b.id, "250.50"), deal(b.id, "49.50")];
        let board = group_pipeline(vec![a, b], deals).unwrap();

        let sum: Decimal = board.pipeline.iter().map(|c| c.total_value).sum();
        assert_eq!(sum, board.summary.total_value);
        assert_eq!(board.summary.total_deals, 3);
        assert!(board.orphaned.is_empty());
    }

    #[test]
    fn orphaned_deals_count_in_summary_only() {
        let a = stage("a", 1);
        let orphan = deal(Uuid::new_v4(), "500");
        let orphan_id = orphan.deal.id;
        let board = group_pipeline(vec![a.clone()], vec![deal(a.id, "100"), orphan]).unwrap();

        assert_eq!(board.pipeline[0].deal_count, 1);
        assert_eq!(board.summary.total_deals, 2);
        assert_eq!(board.summary.total_value, Decimal::from(600));
        assert_eq!(board.orphaned, vec![orphan_id]);
    }

    #[test]
    fn deals_keep_input_order_within_a_column() {
        let a = stage("a", 1);
        let first = deal(a.id, "1");
        let second = deal(a.id, "2");
        let ids = vec![first.deal.id, second.deal.id];
        let board = group_pipeline(vec![a], vec![first, second]).unwrap();

        let got: Vec<Uuid> = board.pipeline[0].deals.iter().map(|d| d.deal.id).collect();
        assert_eq!(got, ids);
    }

    #[test]
    fn totals_that_overflow_are_an_error() {
        let a = stage("a", 1);
        let huge = Decimal::MAX.to_string();
        let result = group_pipeline(vec![a.clone()], vec![deal(a.id, &huge), deal(a.id, &huge)]);

        assert!(matches!(result, Err(crate::error::CrmError::Store(_))));
    }
}
