use serde::{Deserialize, Serialize};

use crate::foundation::core::FeatureId;
use crate::state::manager::FeatureAnimationStateManager;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClickAction {
    #[default]
    Toggle,
    Play,
    Pause,
    Reset,
    PlayOnce,
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HoverBehavior {
    #[default]
    None,
    /// Play while hovered, pause on leave.
    PlayOnHover,
    /// Pause while hovered, resume on leave.
    PauseOnHover,
}

/// Per-layer interactivity settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractivityConfig {
    /// Property holding the feature id. Falls back to the explicit id, then position.
    pub feature_id_property: Option<String>,
    pub per_feature_control: bool,
    pub initial_state: InitialPlayState,
    pub on_click: ClickAction,
    pub on_hover: HoverBehavior,
}

impl Default for InteractivityConfig {
    fn default() -> Self {
        Self {
            feature_id_property: None,
            per_feature_control: false,
            initial_state: InitialPlayState::Playing,
            on_click: ClickAction::Toggle,
            on_hover: HoverBehavior::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialPlayState {
    #[default]
    Playing,
    Paused,
}

impl InitialPlayState {
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Host pick results. Hit-testing happens on the host side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    Click(FeatureId),
    HoverEnter(FeatureId),
    HoverLeave(FeatureId),
}

/// Translates host interaction events into state-manager calls.
#[derive(Debug, Clone, Default)]
pub struct FeatureInteractionHandler {
    config: InteractivityConfig,
    hovered: Option<FeatureId>,
}

impl FeatureInteractionHandler {
    pub fn new(config: InteractivityConfig) -> Self {
        Self {
            config,
            hovered: None,
        }
    }

    pub fn config(&self) -> &InteractivityConfig {
        &self.config
    }

    pub fn hovered(&self) -> Option<&FeatureId> {
        self.hovered.as_ref()
    }

    /// Apply one event. Returns whether any feature state changed.
    pub fn handle(
        &mut self,
        manager: &mut FeatureAnimationStateManager,
        event: &InteractionEvent,
    ) -> bool {
        if !self.config.per_feature_control {
            return false;
        }
        match event {
            InteractionEvent::Click(id) => self.click(manager, id),
            InteractionEvent::HoverEnter(id) => {
                let mut changed = false;
                if let Some(prev) = self.hovered.take()
                    && prev != *id
                {
                    changed |= self.leave(manager, &prev);
                }
                self.hovered = Some(id.clone());
                changed | self.enter(manager, id)
            }
            InteractionEvent::HoverLeave(id) => {
                if self.hovered.as_ref() == Some(id) {
                    self.hovered = None;
                }
                self.leave(manager, id)
            }
        }
    }

    fn click(&self, manager: &mut FeatureAnimationStateManager, id: &FeatureId) -> bool {
        match self.config.on_click {
            ClickAction::Toggle => manager.toggle(id),
            ClickAction::Play => manager.play(id),
            ClickAction::Pause => manager.pause(id),
            ClickAction::Reset => manager.reset(id),
            ClickAction::PlayOnce => manager.play_once(id),
            ClickAction::None => false,
        }
    }

    fn enter(&self, manager: &mut FeatureAnimationStateManager, id: &FeatureId) -> bool {
        match self.config.on_hover {
            HoverBehavior::None => false,
            HoverBehavior::PlayOnHover => manager.play(id),
            HoverBehavior::PauseOnHover => manager.pause(id),
        }
    }

    fn leave(&self, manager: &mut FeatureAnimationStateManager, id: &FeatureId) -> bool {
        match self.config.on_hover {
            HoverBehavior::None => false,
            HoverBehavior::PlayOnHover => manager.pause(id),
            HoverBehavior::PauseOnHover => manager.play(id),
        }
    }
}
