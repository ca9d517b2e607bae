//! Static "About" page content

use serde::{Deserialize, Serialize};

const PARAGRAPHS: [&str; 3] = [
    "Hi, I'm Antonio. I'm a senior at NYU double majoring in computer science and math, with minors in history and Spanish. I chose CS and math mainly because they're solid, practical degrees and I like problem-solving—figuring out how things work, breaking problems down, and building solutions that actually do something. History is more of a personal interest and something I genuinely enjoy studying, and Spanish came from wanting to improve my language skills, stay connected to my background, and learn more about different cultures. I also studied abroad for a semester at NYU Madrid, which helped push my Spanish and gave me a different perspective outside the U.S.",
    "Outside of classes, I work full-time as a software engineer at a sports AI startup--RotoBot AI. I've worked across the full stack, but most of my focus is on backend and data work. I like working on systems, pipelines, and the parts of a product that keep everything running smoothly. Most of my time is split between school, work, training, and side projects, and I'm pretty focused on building skills and setting myself up well after graduation.",
    "With my free time, I like to keep things pretty balanced. I enjoy reading, and right now I'm reading The Correspondent by Virginia Evans (honestly a 10/10, highly recommend). My favorite book is East of Eden by John Steinbeck, which is also a 10/10 and one of those books everyone should read at least once. I also spend a lot of time in the gym—lifting, running, and training MMA. I compete a couple of times a year, which keeps me disciplined and gives me something concrete to work toward. Lately, I've also been experimenting more with cooking and trying new recipes—some turn out great, some… not so much (chicken does NOT belong in brownies).",
];

const IMAGE_URL: &str =
    "https://drive.google.com/thumbnail?id=1evHLNhlxrrPpomEN5JPRqjVXq-871O2q&sz=w400";

/// Body of `GET /about`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutContent {
    pub paragraphs: Vec<String>,
    pub image_url: String,
}

impl Default for AboutContent {
    fn default() -> Self {
        Self {
            paragraphs: PARAGRAPHS.iter().map(ToString::to_string).collect(),
            image_url: IMAGE_URL.to_string(),
        }
    }
}
