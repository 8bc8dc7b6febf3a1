mod build;
mod context;
mod fuel;
mod launch;
mod physics;
mod recycle;
mod sequence;
mod title;
mod tutorial;

pub use context::{StageContext, StageToken};
pub use sequence::{MediaSequence, SeqEvent};

use anyhow::Result;

use crate::render::StageView;

/// Position in the exhibit's linear narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Title,
    Tutorial,
    Physics,
    Build,
    Fuel,
    Launch,
    Recycle,
}

impl StageKind {
    /// The stage that follows this one; the narrative loops back to the
    /// title after recycling.
    pub fn next(self) -> StageKind {
        match self {
            StageKind::Title => StageKind::Tutorial,
            StageKind::Tutorial => StageKind::Physics,
            StageKind::Physics => StageKind::Build,
            StageKind::Build => StageKind::Fuel,
            StageKind::Fuel => StageKind::Launch,
            StageKind::Launch => StageKind::Recycle,
            StageKind::Recycle => StageKind::Title,
        }
    }

    /// The attract/home stage; exempt from the inactivity timeout.
    pub fn is_home(self) -> bool {
        self == StageKind::Title
    }
}

/// Requested move at the end of a stage update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTransition {
    None,
    /// Move to `kind().next()`.
    Advance,
    /// Return to the title stage (inactivity or end of experience).
    Home,
}

/// One stage of the exhibit.
///
/// Stages supply content wiring and their private phase graph; gating,
/// fades, media progression and cancellation all come from the context.
pub trait Stage {
    fn kind(&self) -> StageKind;

    /// Load content and start the entry fade. Runs with input gated off;
    /// an error leaves the stage input-disabled but alive.
    fn init(&mut self, ctx: &mut StageContext<'_>) -> Result<()>;

    /// One frame of stage logic.
    fn update(&mut self, ctx: &mut StageContext<'_>) -> StageTransition;

    fn draw(&self, view: &mut StageView<'_>);

    /// Release per-stage resources before the exit fade. The controller
    /// cancels the stage token and stops media around this call.
    fn teardown(&mut self, _ctx: &mut StageContext<'_>) {}
}

/// Build the stage object for a narrative position.
pub fn create(kind: StageKind) -> Box<dyn Stage> {
    match kind {
        StageKind::Title => Box::new(title::TitleStage::new()),
        StageKind::Tutorial => Box::new(tutorial::TutorialStage::new()),
        StageKind::Physics => Box::new(physics::PhysicsStage::new()),
        StageKind::Build => Box::new(build::BuildStage::new()),
        StageKind::Fuel => Box::new(fuel::FuelStage::new()),
        StageKind::Launch => Box::new(launch::LaunchStage::new()),
        StageKind::Recycle => Box::new(recycle::RecycleStage::new()),
    }
}
