//! Image icons loaded by the host after startup.
//!
//! Loading is asynchronous and allowed to fail. Until an icon is ready, or forever if
//! it failed, the renderer draws a vector stand-in.

use log::{info, warn};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Cheese,
    Heart,
}

impl IconKind {
    pub const ALL: [IconKind; 2] = [IconKind::Cheese, IconKind::Heart];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cheese => "cheese",
            Self::Heart => "heart",
        }
    }

    /// Path relative to the page.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Cheese => "assets/cheese.png",
            Self::Heart => "assets/heart.png",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IconSlot<B> {
    Pending,
    Ready(B),
    Failed,
}

impl<B> IconSlot<B> {
    pub fn bitmap(&self) -> Option<&B> {
        match self {
            Self::Ready(bitmap) => Some(bitmap),
            Self::Pending | Self::Failed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Icons<B> {
    pub cheese: IconSlot<B>,
    pub heart: IconSlot<B>,
}

impl<B> Default for Icons<B> {
    fn default() -> Self {
        Self {
            cheese: IconSlot::Pending,
            heart: IconSlot::Pending,
        }
    }
}

impl<B> Icons<B> {
    pub fn get(&self, kind: IconKind) -> &IconSlot<B> {
        match kind {
            IconKind::Cheese => &self.cheese,
            IconKind::Heart => &self.heart,
        }
    }

    /// Stores a load result. A failure is logged and leaves the fallback in place.
    pub fn resolve(&mut self, kind: IconKind, result: Result<B, EngineError>) {
        let slot = match result {
            Ok(bitmap) => {
                info!("icon `{}` ready", kind.name());
                IconSlot::Ready(bitmap)
            }
            Err(err) => {
                warn!("{err}; drawing fallback for `{}`", kind.name());
                IconSlot::Failed
            }
        };
        match kind {
            IconKind::Cheese => self.cheese = slot,
            IconKind::Heart => self.heart = slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_load_degrades_to_fallback() {
        let mut icons: Icons<u32> = Icons::default();
        icons.resolve(IconKind::Cheese, Err(EngineError::asset("cheese", "404")));
        assert_eq!(icons.cheese, IconSlot::Failed);
        assert!(icons.get(IconKind::Cheese).bitmap().is_none());
        assert_eq!(icons.heart, IconSlot::Pending);
    }

    #[test]
    fn successful_load_is_drawable() {
        let mut icons: Icons<u32> = Icons::default();
        icons.resolve(IconKind::Heart, Ok(7));
        assert_eq!(icons.get(IconKind::Heart).bitmap(), Some(&7));
    }
}
