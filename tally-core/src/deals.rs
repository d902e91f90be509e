//! Deal lifecycle: creation, edits, stage transitions and the board view.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::{now, Database, DealChanges};
use crate::error::{CrmError, CrmResult};
use crate::models::{
    CreateDealInput, Deal, DealFilter, DealView, PipelineStage, StageTransitionInput,
    UpdateDealInput,
};
use crate::money::checked_amount;
use crate::pipeline::{group_pipeline, Pipeline};
use crate::policy::ClosedStagePolicy;

#[derive(Clone)]
pub struct DealService {
    db: Database,
    policy: Arc<ClosedStagePolicy>,
}

impl DealService {
    pub fn new(db: Database, policy: Arc<ClosedStagePolicy>) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> &ClosedStagePolicy {
        &self.policy
    }

    pub fn list_stages(&self) -> CrmResult<Vec<PipelineStage>> {
        self.db.list_stages()
    }

    pub fn resolve_stage_by_name(&self, name: &str) -> CrmResult<PipelineStage> {
        self.db
            .get_stage_by_name(name)?
            .ok_or_else(|| CrmError::NotFound(format!("stage '{}' not found", name)))
    }

    pub fn list_deals(&self, filter: &DealFilter) -> CrmResult<Vec<DealView>> {
        self.db.list_deals(filter)
    }

    pub fn get_deal(&self, id: Uuid) -> CrmResult<DealView> {
        self.db
            .get_deal_view(id)?
            .ok_or_else(|| CrmError::not_found("deal"))
    }

    pub fn create(&self, input: CreateDealInput) -> CrmResult<Deal> {
        let name = required_name(input.name.as_deref())?;
        let stage = match (input.stage_id, stage_key(input.stage_name.as_deref())) {
            (Some(id), _) => self.stage_by_id(id)?,
            (None, Some(name)) => self.stage_by_name(name)?,
            (None, None) => self
                .db
                .first_stage()?
                .ok_or_else(|| CrmError::validation("no pipeline stages are configured"))?,
        };
        let value = checked_value(input.value)?;

        let now = now();
        let deal = Deal {
            id: Uuid::new_v4(),
            contact_id: input.contact_id,
            stage_id: stage.id,
            product_id: input.product_id,
            name,
            value,
            notes: input.notes,
            expected_close: input.expected_close,
            plan_type: input.plan_type.unwrap_or_default(),
            lead_source: input.lead_source,
            closed_at: self.policy.is_closed(&stage.name).then_some(now),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_deal(&deal)?;

        tracing::info!(deal_id = %deal.id, stage = %stage.name, "created deal");
        Ok(deal)
    }

    /// Full replacement of the editable fields. A stage change made here
    /// recomputes `closed_at` exactly like [`DealService::transition_stage`];
    /// an omitted `stage_id` keeps the stage current at write time.
    pub fn update(&self, id: Uuid, input: UpdateDealInput) -> CrmResult<Deal> {
        let changes = DealChanges {
            contact_id: input.contact_id,
            stage_id: input.stage_id,
            product_id: input.product_id,
            name: required_name(input.name.as_deref())?,
            value: checked_value(input.value)?,
            notes: input.notes,
            expected_close: input.expected_close,
            plan_type: input.plan_type.unwrap_or_default(),
            lead_source: input.lead_source,
        };

        self.db
            .update_deal(id, &changes, &self.policy, now())?
            .ok_or_else(|| CrmError::not_found("deal"))
    }

    pub fn transition_stage(&self, id: Uuid, input: StageTransitionInput) -> CrmResult<Deal> {
        self.transition_stage_at(id, input, now())
    }

    pub(crate) fn transition_stage_at(
        &self,
        id: Uuid,
        input: StageTransitionInput,
        now: DateTime<Utc>,
    ) -> CrmResult<Deal> {
        let stage_name = stage_key(input.stage_name.as_deref());
        if input.stage_id.is_none() && stage_name.is_none() {
            return Err(CrmError::validation("stage_name or stage_id is required"));
        }

        let current = self
            .db
            .get_deal(id)?
            .ok_or_else(|| CrmError::not_found("deal"))?;

        let target = match (input.stage_id, stage_name) {
            (Some(stage_id), _) => self.stage_by_id(stage_id)?,
            (None, Some(name)) => self.stage_by_name(name)?,
            (None, None) => return Err(CrmError::validation("stage_name or stage_id is required")),
        };
        let closed = self.policy.is_closed(&target.name);

        let deal = self
            .db
            .set_deal_stage(id, target.id, closed, now)?
            .ok_or_else(|| CrmError::not_found("deal"))?;

        tracing::info!(
            deal_id = %id,
            from = %current.stage_id,
            to = %target.name,
            closed,
            "moved deal to new stage"
        );
        Ok(deal)
    }

    pub fn delete(&self, id: Uuid) -> CrmResult<()> {
        if !self.db.delete_deal(id)? {
            return Err(CrmError::not_found("deal"));
        }
        tracing::info!(deal_id = %id, "deleted deal");
        Ok(())
    }

    /// Two reads (stages, then deals) followed by the in-memory grouping.
    pub fn get_pipeline(&self) -> CrmResult<Pipeline> {
        let stages = self.db.list_stages()?;
        let deals = self.db.list_deals(&DealFilter::default())?;
        let pipeline = group_pipeline(stages, deals)?;
        if !pipeline.orphaned.is_empty() {
            tracing::warn!(
                orphaned = ?pipeline.orphaned,
                "deals reference unknown stages; counted in summary only"
            );
        }
        Ok(pipeline)
    }

    fn stage_by_id(&self, id: Uuid) -> CrmResult<PipelineStage> {
        self.db
            .get_stage(id)?
            .ok_or_else(|| CrmError::Validation(format!("unknown stage id '{}'", id)))
    }

    fn stage_by_name(&self, name: &str) -> CrmResult<PipelineStage> {
        self.db
            .get_stage_by_name(name)?
            .ok_or_else(|| CrmError::Validation(format!("unknown stage '{}'", name)))
    }
}

fn required_name(name: Option<&str>) -> CrmResult<String> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(CrmError::validation("name is required")),
    }
}

fn checked_value(value: Option<Decimal>) -> CrmResult<Decimal> {
    checked_amount(value.unwrap_or_default(), "value")
}

/// Stage keys arrive from forms and query strings; surrounding blanks are
/// not part of the name.
fn stage_key(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|name| !name.is_empty())
}
