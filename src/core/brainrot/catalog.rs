// Brainrot catalog definitions
//
// The catalog is read-only reference data: every farmable brainrot together
// with its rarity tier. Nobody owns a catalog entry; inventory slots point at
// one by id.

use super::BrainrotError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Rarity tier of a catalog entry. Drives how often it is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
    BrainrotGod,
    Secret,
    /// Any label the game doesn't know about. Drawn with the minimum weight.
    Other(String),
}

impl Rarity {
    /// Parse a stored rarity label. Case, spaces and underscores are ignored.
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "common" => Rarity::Common,
            "rare" => Rarity::Rare,
            "epic" => Rarity::Epic,
            "legendary" => Rarity::Legendary,
            "mythic" => Rarity::Mythic,
            "brainrotgod" => Rarity::BrainrotGod,
            "secret" => Rarity::Secret,
            _ => Rarity::Other(label.trim().to_string()),
        }
    }

    /// Label used for storage and chat output.
    pub fn as_str(&self) -> &str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
            Rarity::BrainrotGod => "Brainrot God",
            Rarity::Secret => "Secret",
            Rarity::Other(label) => label.as_str(),
        }
    }

    /// Relative draw weight. Every tier above Mythic shares the floor of 1.
    pub fn weight(&self) -> u32 {
        match self {
            Rarity::Common => 15,
            Rarity::Rare => 10,
            Rarity::Epic => 7,
            Rarity::Legendary => 4,
            Rarity::Mythic => 2,
            Rarity::BrainrotGod | Rarity::Secret | Rarity::Other(_) => 1,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Rarity {
    fn from(label: String) -> Self {
        Rarity::parse(&label)
    }
}

impl From<Rarity> for String {
    fn from(rarity: Rarity) -> Self {
        rarity.as_str().to_string()
    }
}

/// A persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub rarity: Rarity,
}

/// A catalog entry before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCatalogItem {
    pub name: String,
    pub rarity: Rarity,
}

impl NewCatalogItem {
    pub fn new(name: &str, rarity: Rarity) -> Self {
        Self {
            name: name.to_string(),
            rarity,
        }
    }
}

/// Draw one entry, weighting each by its rarity.
///
/// Sampling runs over cumulative weights, so an entry's chance is its weight
/// divided by the sum of all weights in the catalog.
pub fn draw_random_item<'a, R: Rng + ?Sized>(
    catalog: &'a [CatalogItem],
    rng: &mut R,
) -> Result<&'a CatalogItem, BrainrotError> {
    if catalog.is_empty() {
        return Err(BrainrotError::EmptyCatalog);
    }

    catalog
        .choose_weighted(rng, |item| item.rarity.weight())
        .map_err(|_| BrainrotError::EmptyCatalog)
}

/// Built-in catalog used when no catalog file is configured.
pub fn default_catalog() -> Vec<NewCatalogItem> {
    vec![
        NewCatalogItem::new("Noobini Pizzanini", Rarity::Common),
        NewCatalogItem::new("Lirili Larila", Rarity::Common),
        NewCatalogItem::new("Tim Cheese", Rarity::Common),
        NewCatalogItem::new("Pipi Kiwi", Rarity::Common),
        NewCatalogItem::new("Trippi Troppi", Rarity::Rare),
        NewCatalogItem::new("Brr Brr Patapim", Rarity::Rare),
        NewCatalogItem::new("Boneca Ambalabu", Rarity::Rare),
        NewCatalogItem::new("Cappuccino Assassino", Rarity::Epic),
        NewCatalogItem::new("Chimpanzini Bananini", Rarity::Epic),
        NewCatalogItem::new("Ballerina Cappuccina", Rarity::Epic),
        NewCatalogItem::new("Tung Tung Tung Sahur", Rarity::Legendary),
        NewCatalogItem::new("Tralalero Tralala", Rarity::Legendary),
        NewCatalogItem::new("Bombardiro Crocodilo", Rarity::Mythic),
        NewCatalogItem::new("Frigo Camelo", Rarity::Mythic),
        NewCatalogItem::new("Cocofanto Elefanto", Rarity::BrainrotGod),
        NewCatalogItem::new("La Vaca Saturno Saturnita", Rarity::Secret),
    ]
}

/// Load catalog entries from a JSON array of `{ "name", "rarity" }` objects.
pub fn load_catalog_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<NewCatalogItem>> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let entries: Vec<NewCatalogItem> = serde_json::from_str(&raw)?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(id: i64, name: &str, rarity: Rarity) -> CatalogItem {
        CatalogItem {
            id,
            name: name.to_string(),
            rarity,
        }
    }

    #[test]
    fn test_rarity_parsing() {
        assert_eq!(Rarity::parse("common"), Rarity::Common);
        assert_eq!(Rarity::parse("LEGENDARY"), Rarity::Legendary);
        assert_eq!(Rarity::parse("Brainrot God"), Rarity::BrainrotGod);
        assert_eq!(Rarity::parse("brainrot_god"), Rarity::BrainrotGod);
        assert_eq!(Rarity::parse("OG"), Rarity::Other("OG".to_string()));
    }

    #[test]
    fn test_rarity_weights() {
        assert_eq!(Rarity::Common.weight(), 15);
        assert_eq!(Rarity::Rare.weight(), 10);
        assert_eq!(Rarity::Epic.weight(), 7);
        assert_eq!(Rarity::Legendary.weight(), 4);
        assert_eq!(Rarity::Mythic.weight(), 2);
        assert_eq!(Rarity::Secret.weight(), 1);
        assert_eq!(Rarity::Other("Limited".to_string()).weight(), 1);
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = draw_random_item(&[], &mut rng);
        assert!(matches!(result, Err(BrainrotError::EmptyCatalog)));
    }

    #[test]
    fn test_draw_frequencies_follow_weights() {
        let catalog = vec![
            item(1, "Lirili Larila", Rarity::Common),
            item(2, "Tralalero Tralala", Rarity::Legendary),
        ];
        let mut rng = StdRng::seed_from_u64(42);

        let mut common = 0u32;
        let mut legendary = 0u32;
        for _ in 0..190_000 {
            match draw_random_item(&catalog, &mut rng).unwrap().id {
                1 => common += 1,
                _ => legendary += 1,
            }
        }

        let ratio = common as f64 / legendary as f64;
        assert!(
            (ratio - 15.0 / 4.0).abs() < 0.1,
            "expected ~3.75, got {ratio}"
        );
    }

    #[test]
    fn test_catalog_entries_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"name": "Tim Cheese", "rarity": "common"}, {"name": "Gangster Footera", "rarity": "OG"}]"#,
        )
        .unwrap();

        let entries = load_catalog_file(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rarity, Rarity::Common);
        assert_eq!(entries[1].rarity, Rarity::Other("OG".to_string()));
    }

    #[test]
    fn test_default_catalog_covers_every_tier() {
        let entries = default_catalog();
        for tier in [
            Rarity::Common,
            Rarity::Rare,
            Rarity::Epic,
            Rarity::Legendary,
            Rarity::Mythic,
            Rarity::BrainrotGod,
            Rarity::Secret,
        ] {
            assert!(entries.iter().any(|e| e.rarity == tier), "missing {tier}");
        }
    }
}
