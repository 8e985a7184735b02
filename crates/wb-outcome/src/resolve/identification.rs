//! Identification resolution.
//!
//! Success reveals the item. Failure locks the actor out until they gain a
//! level. A critical failure swaps the item for a plausible substitute the
//! player believes they identified, unless the actor has assured
//! identification or no substitute can be found, in which case it counts
//! as a failure.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use wb_core::{
    ActorView, IdentificationState, IdentificationStatus, InventoryItem, ItemData, RetryMarker,
};

use super::Resolution;
use crate::collaborators::{ItemDefinitionFetch, ItemIndexSearch};
use crate::config::{EngineConfig, ReplacementConfig};
use crate::consequence::{ConsequenceDescriptor, ItemChange};
use crate::degree::DegreeOfSuccess;
use crate::difficulty::{DifficultyCalculator, DifficultyRequest};
use crate::error::EngineResult;
use crate::feats::{ActivityTime, Capabilities, OutcomeEffect, Skill};
use crate::replacement::select_replacement;

const TRADITION_SKILLS: &[(&str, Skill)] = &[
    ("arcane", Skill::Arcana),
    ("divine", Skill::Religion),
    ("occult", Skill::Occultism),
    ("primal", Skill::Nature),
];

const DEFAULT_TIME: ActivityTime = ActivityTime::Minutes(10);

/// Everything the host needs to prompt for an identification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationPlan {
    /// The check's DC.
    pub dc: u32,
    /// Skills the actor may roll, in display order.
    pub skills: Vec<Skill>,
    /// Bonus from feats that apply to this item.
    pub roll_bonus: i32,
    /// How long the attempt takes.
    pub time: ActivityTime,
    /// The actor already failed at their current level.
    pub locked_out: bool,
}

/// Work out the DC, skills, and modifiers for identifying `item`.
pub fn plan_identification(
    item: &ItemData,
    actor: &ActorView,
    capabilities: &Capabilities,
    config: &EngineConfig,
) -> EngineResult<IdentificationPlan> {
    let dc = DifficultyCalculator::from_config(config)
        .calculate(&DifficultyRequest::for_item(item))?;

    let mut skills: BTreeSet<Skill> = TRADITION_SKILLS
        .iter()
        .filter(|(tradition, _)| item.traits.contains(tradition))
        .map(|(_, skill)| *skill)
        .collect();
    if skills.is_empty() {
        skills.extend(TRADITION_SKILLS.iter().map(|(_, skill)| *skill));
    }
    skills.extend(capabilities.substitute_skills());

    Ok(IdentificationPlan {
        dc,
        skills: skills.into_iter().collect(),
        roll_bonus: capabilities.roll_bonus(&item.traits),
        time: capabilities.time_override().unwrap_or(DEFAULT_TIME),
        locked_out: item.identification.is_locked_out(actor.id, actor.level),
    })
}

/// A fully resolved identification selection.
#[derive(Debug, Clone, Copy)]
pub struct IdentificationRequest<'a> {
    /// The identifier.
    pub actor: &'a ActorView,
    /// The item being identified.
    pub item: &'a InventoryItem,
    /// The actor's feat capabilities.
    pub capabilities: &'a Capabilities,
}

impl IdentificationRequest<'_> {
    fn shown_name(&self) -> &str {
        self.item
            .data
            .identification
            .unidentified_name
            .as_deref()
            .unwrap_or(&self.item.data.name)
    }
}

/// The degree after feat adjustments: assured identification turns a
/// critical failure into a failure.
pub fn effective_degree(raw: DegreeOfSuccess, capabilities: &Capabilities) -> DegreeOfSuccess {
    if raw == DegreeOfSuccess::CriticalFailure
        && capabilities.has_effect(OutcomeEffect::AssuredIdentification)
    {
        DegreeOfSuccess::Failure
    } else {
        raw
    }
}

/// Resolve the outcomes that need no replacement. A critical failure is
/// treated as a failure.
pub fn settle_identification(
    degree: DegreeOfSuccess,
    request: &IdentificationRequest<'_>,
) -> Resolution {
    let actor = request.actor;
    let item = request.item;
    let state = &item.data.identification;

    if state.is_identified() {
        let mut consequence = ConsequenceDescriptor::new(degree);
        consequence.narrate(format!("{} is already identified.", item.data.name));
        return Resolution::new(consequence);
    }

    if degree.is_success() {
        let mut consequence = ConsequenceDescriptor::new(degree);
        consequence.update(
            item.id,
            ItemChange::Identification(IdentificationState {
                status: IdentificationStatus::Identified,
                unidentified_name: state.unidentified_name.clone(),
                failed_attempt: None,
            }),
        );
        consequence.narrate(format!(
            "{} identifies {} as {}.",
            actor.name,
            request.shown_name(),
            item.data.name
        ));
        return Resolution::new(consequence);
    }

    let marker = RetryMarker {
        actor: actor.id,
        level: actor.level,
    };
    let mut consequence = ConsequenceDescriptor::new(DegreeOfSuccess::Failure);
    consequence.update(
        item.id,
        ItemChange::Identification(IdentificationState {
            status: IdentificationStatus::Unidentified,
            unidentified_name: state.unidentified_name.clone(),
            failed_attempt: Some(marker),
        }),
    );
    consequence.retry_lockout = Some(marker);
    consequence.narrate(format!(
        "{} fails to identify {} and cannot try again before reaching level {}.",
        actor.name,
        request.shown_name(),
        actor.level + 1
    ));
    Resolution::new(consequence)
}

/// Resolve an identification attempt, searching for a substitute on a
/// critical failure. Any problem finding one downgrades to a failure.
pub async fn resolve_identification(
    raw: DegreeOfSuccess,
    request: &IdentificationRequest<'_>,
    index: &dyn ItemIndexSearch,
    fetch: &dyn ItemDefinitionFetch,
    config: &ReplacementConfig,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> Resolution {
    let degree = effective_degree(raw, request.capabilities);
    if degree != raw {
        tracing::debug!(
            actor = %request.actor.name,
            "assured identification downgraded critical failure"
        );
    }
    if degree != DegreeOfSuccess::CriticalFailure
        || request.item.data.identification.is_identified()
    {
        return settle_identification(degree, request);
    }

    let actor = request.actor;
    let item = request.item;
    match select_replacement(index, fetch, &item.data, actor, config, rng, now).await {
        Ok(replacement) => {
            let mut consequence = ConsequenceDescriptor::new(DegreeOfSuccess::CriticalFailure);
            consequence.narrate(format!(
                "{} identifies {} as {}.",
                actor.name,
                request.shown_name(),
                replacement.data.name
            ));
            consequence.gm_narrative = Some(format!(
                "{} critically failed to identify {} (level {} {}). \
                 It was replaced by {} ({} match).",
                actor.name,
                item.data.name,
                item.data.level,
                item.data.kind,
                replacement.selected.name,
                replacement.tier
            ));
            consequence.create(replacement.data);
            consequence.delete(item.id);
            Resolution::new(consequence)
        }
        Err(e) => {
            tracing::warn!(
                actor = %actor.name,
                item = %item.id,
                error = %e,
                "replacement failed, resolving as failure"
            );
            settle_identification(DegreeOfSuccess::Failure, request)
        }
    }
}
