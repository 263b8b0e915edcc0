use serde::{Deserialize, Serialize};

use super::image::ImageSource;

/// A target object to hunt for, with the image pools a level is dealt from.
///
/// Half of every dealt training set is labeled as containing the object, so
/// the pool only needs to supply enough distinct pictures; the ground truth is
/// assigned when the level starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub target_object: String,
    pub description: String,
    pub images: Vec<ImageSource>,
    /// Held-out images; the first half contain the object.
    pub test_images: Vec<ImageSource>,
}

const PEXELS_QUERY: &str = "?auto=compress&cs=tinysrgb&w=800";

fn pexels(id: u32) -> ImageSource {
    format!("https://images.pexels.com/photos/{id}/pexels-photo-{id}.jpeg{PEXELS_QUERY}").into()
}

/// Categories played in order; level `n` uses entry `(n - 1) % len`.
#[must_use]
pub fn builtin_catalog() -> Vec<Category> {
    let wally = Category {
        name: "wally".to_owned(),
        target_object: "Wally".to_owned(),
        description: "Find Wally in the crowd - look for his red and white striped shirt, \
                      bobble hat, and glasses!"
            .to_owned(),
        images: (1..=20)
            .map(|i| ImageSource::from(format!("assets/wally/training-{i:02}.png")))
            .collect(),
        test_images: [
            ImageSource::from("assets/wally/crowd-scene.png"),
            pexels(1_190_297),
            pexels(417_074),
            pexels(1_563_356),
            pexels(1_366_919),
        ]
        .into(),
    };
    let advanced_wally = Category {
        name: "advanced_wally".to_owned(),
        target_object: "Wally".to_owned(),
        description: "Advanced Wally finding - even more challenging crowd scenes!".to_owned(),
        images: (2_747_449..=2_747_468).map(pexels).collect(),
        test_images: (3_184_291..=3_184_300).map(pexels).collect(),
    };
    vec![wally, advanced_wally]
}
