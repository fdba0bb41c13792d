//! Meme Records
//!
//! A meme is immutable once created. Feeds hold shared handles to it, so a
//! meme reshared to thousands of feeds exists once and is freed when the
//! last feed evicts it.

use bevy_ecs::prelude::*;
use market_events::Role;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Highest quality a human meme can have
pub const MAX_QUALITY: f64 = 1.0;

/// Unique identifier for a meme within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemeId(pub u64);

/// A content item
#[derive(Debug, Clone, PartialEq)]
pub struct Meme {
    pub id: MemeId,
    /// Intrinsic worth, 0.0 for bot memes
    pub quality: f64,
    /// Drives selection for resharing
    pub fitness: f64,
    pub origin: Role,
    /// Step at which the meme was posted
    pub created_at: u64,
}

impl Meme {
    pub fn is_low_quality(&self) -> bool {
        self.quality <= 0.0
    }
}

/// Shared handle stored in feeds
pub type MemeRef = Arc<Meme>;

/// How quality and fitness are drawn for new memes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemeModel {
    /// Human quality ~ U[0,1] with fitness equal to quality; bot memes have
    /// zero quality and fixed fitness phi * MAX_QUALITY.
    #[default]
    Reference,
    /// Inverse transform draws: human fitness = quality =
    /// 1 - (1-u)^(1/(1+phi)); bot fitness = 1 - (1-u)^(1/(1+1/phi)).
    /// Larger phi skews human memes low and bot memes high.
    Deceptive,
}

impl MemeModel {
    /// Draw (quality, fitness) for a meme originated by `role`.
    pub fn draw<R: Rng>(self, role: Role, phi: f64, rng: &mut R) -> (f64, f64) {
        match (self, role) {
            (MemeModel::Reference, Role::Human) => {
                let quality = rng.gen::<f64>() * MAX_QUALITY;
                (quality, quality)
            }
            (MemeModel::Reference, Role::Bot) => (0.0, phi * MAX_QUALITY),
            (MemeModel::Deceptive, Role::Human) => {
                let quality = inverse_transform(rng.gen(), 1.0 + phi);
                (quality, quality)
            }
            (MemeModel::Deceptive, Role::Bot) => {
                (0.0, inverse_transform(rng.gen(), 1.0 + 1.0 / phi))
            }
        }
    }
}

fn inverse_transform(u: f64, exponent: f64) -> f64 {
    1.0 - (1.0 - u).powf(1.0 / exponent)
}

/// Post counts for one meme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Popularity {
    pub posts: u64,
    pub human_posts: u64,
    pub bot_posts: u64,
}

/// Resource that allocates memes and keeps counters
#[derive(Resource, Debug, Default)]
pub struct MemeRegistry {
    next_id: u64,
    human_memes: u64,
    bot_memes: u64,
    reshares: u64,
    popularity: Option<HashMap<MemeId, Popularity>>,
}

impl MemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that also counts posts per meme
    pub fn with_tracking() -> Self {
        Self {
            popularity: Some(HashMap::new()),
            ..Self::default()
        }
    }

    /// Create a new meme
    pub fn originate(&mut self, origin: Role, quality: f64, fitness: f64, step: u64) -> MemeRef {
        let id = MemeId(self.next_id);
        self.next_id += 1;
        match origin {
            Role::Human => self.human_memes += 1,
            Role::Bot => self.bot_memes += 1,
        }
        Arc::new(Meme {
            id,
            quality,
            fitness,
            origin,
            created_at: step,
        })
    }

    /// Count a post of `meme` by an agent with role `poster`
    pub fn record_post(&mut self, meme: &Meme, poster: Role, reshare: bool) {
        if reshare {
            self.reshares += 1;
        }
        if let Some(popularity) = self.popularity.as_mut() {
            let entry = popularity.entry(meme.id).or_default();
            entry.posts += 1;
            match poster {
                Role::Human => entry.human_posts += 1,
                Role::Bot => entry.bot_posts += 1,
            }
        }
    }

    pub fn created(&self) -> u64 {
        self.next_id
    }

    pub fn human_memes(&self) -> u64 {
        self.human_memes
    }

    pub fn bot_memes(&self) -> u64 {
        self.bot_memes
    }

    pub fn reshares(&self) -> u64 {
        self.reshares
    }

    pub fn popularity(&self) -> Option<&HashMap<MemeId, Popularity>> {
        self.popularity.as_ref()
    }

    pub fn take_popularity(&mut self) -> Option<HashMap<MemeId, Popularity>> {
        self.popularity.take()
    }
}
