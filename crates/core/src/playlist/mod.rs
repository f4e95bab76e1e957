use std::rc::Rc;

use rand::Rng;

use crate::scene::SharedScene;
use crate::{LuminaireError, Result};

/// An ordered collection of scenes with a current-selection cursor.
///
/// A playlist always has a valid selection. Advancing is total: it either
/// steps sequentially with wraparound, or, when shuffled, jumps to a
/// randomly chosen *other* scene, so the same scene is never selected twice
/// in a row while more than one is available.
#[derive(Debug)]
pub struct Playlist {
    scenes: Vec<SharedScene>,
    current: usize,
    shuffle: bool,
}

impl Playlist {
    /// Creates a playlist that advances through its scenes in order.
    pub fn new(scenes: Vec<SharedScene>) -> Result<Self> {
        Self::build(scenes, false)
    }

    /// Creates a playlist that advances to a random other scene.
    pub fn shuffled(scenes: Vec<SharedScene>) -> Result<Self> {
        Self::build(scenes, true)
    }

    fn build(scenes: Vec<SharedScene>, shuffle: bool) -> Result<Self> {
        if scenes.is_empty() {
            return Err(LuminaireError::config(
                "a playlist requires at least one scene",
            ));
        }
        Ok(Self {
            scenes,
            current: 0,
            shuffle,
        })
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Returns the currently selected scene. Pure and repeatable: the
    /// selection only moves through [`advance`](Playlist::advance).
    pub fn selection(&self) -> SharedScene {
        Rc::clone(&self.scenes[self.current])
    }

    /// Moves the selection forward.
    pub fn advance(&mut self) {
        if self.scenes.len() < 2 {
            return;
        }
        let step = if self.shuffle {
            rand::rng().random_range(1..self.scenes.len())
        } else {
            1
        };
        self.current = (self.current + step) % self.scenes.len();
    }
}
