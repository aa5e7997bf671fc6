use crate::window::MouseButton;

/// Visual state of a container window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinimizeState {
    #[default]
    Open,
    Minimized,
}

/// Input events the state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimizeTrigger {
    /// Button released inside the minimizer hit-region.
    MinimizerReleased(MouseButton),
    /// Double click on the container background sprite.
    BackgroundDoubleClicked(MouseButton),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: MinimizeState,
    /// The input event must not propagate further.
    pub consumed: bool,
}

impl MinimizeState {
    pub fn from_minimized(minimized: bool) -> Self {
        if minimized {
            Self::Minimized
        } else {
            Self::Open
        }
    }

    pub fn is_minimized(self) -> bool {
        self == Self::Minimized
    }

    /// Visibility of every child other than the background and the minimizer.
    pub fn children_visible(self) -> bool {
        self == Self::Open
    }

    /// The transition `trigger` causes from this state, if any.
    pub fn next(self, trigger: MinimizeTrigger) -> Option<Transition> {
        match (self, trigger) {
            (Self::Open, MinimizeTrigger::MinimizerReleased(MouseButton::Left)) => Some(Transition {
                to: Self::Minimized,
                consumed: false,
            }),
            (Self::Minimized, MinimizeTrigger::BackgroundDoubleClicked(MouseButton::Left)) => {
                Some(Transition {
                    to: Self::Open,
                    consumed: true,
                })
            }
            _ => None,
        }
    }
}
