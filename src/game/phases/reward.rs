use super::{GameQueue, Routine};
use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::rewards::{RewardPlan, RewardTier};
use crate::game::session::Session;
use crate::gate::GateOutcome;
use crate::phase::Step;
use tracing::{debug, info};

/// Offers the stored reward plan, or a filled default plan, and banks the pick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardPhase {
    offers: Vec<RewardTier>,
}

impl RewardPhase {
    pub fn offers(&self) -> &[RewardTier] {
        &self.offers
    }
}

impl Routine for RewardPhase {
    const NAME: &'static str = "reward";

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        let plan = session
            .rewards
            .take()
            .unwrap_or_else(RewardPlan::fill_remaining);
        self.offers = session.reward_offers(&plan)?;
        debug!(offers = ?self.offers, "Reward offers drawn");
        let gate = session.present(
            queue,
            Effect::RewardOffer {
                tiers: self.offers.clone(),
            },
        )?;
        Ok(Step::Await(gate))
    }

    fn resume(
        &mut self,
        session: &mut Session,
        _queue: &mut GameQueue<'_>,
        outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        match outcome.choice().and_then(|index| self.offers.get(index)) {
            Some(tier) => {
                session.inventory.add(*tier);
                info!(tier = %tier, "Reward taken");
            }
            None => debug!("Rewards skipped"),
        }
        Ok(Step::End)
    }
}
