//! Points shop of cosmetic items.

use chrono::Utc;
use fandom_common::{AppError, AppResult, IdGenerator};
use fandom_db::{
    entities::{profile, purchase},
    repositories::{ProfileRepository, PurchaseRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::services::points::PointsService;

/// Where an item shows up on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticSlot {
    Frame,
    Badge,
    NameColor,
}

impl CosmeticSlot {
    const fn column(self) -> profile::Column {
        match self {
            Self::Frame => profile::Column::EquippedFrame,
            Self::Badge => profile::Column::EquippedBadge,
            Self::NameColor => profile::Column::EquippedNameColor,
        }
    }

    fn equipped(self, profile: &profile::Model) -> Option<&str> {
        match self {
            Self::Frame => profile.equipped_frame.as_deref(),
            Self::Badge => profile.equipped_badge.as_deref(),
            Self::NameColor => profile.equipped_name_color.as_deref(),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub slot: CosmeticSlot,
    pub price: i64,
    /// CSS class or colour the frontend renders.
    pub value: &'static str,
}

/// Items on sale.
pub const CATALOG: &[ShopItem] = &[
    ShopItem {
        id: "moldura_neon",
        name: "Moldura Neon",
        slot: CosmeticSlot::Frame,
        price: 200,
        value: "frame-neon",
    },
    ShopItem {
        id: "moldura_dourada",
        name: "Moldura Dourada",
        slot: CosmeticSlot::Frame,
        price: 500,
        value: "frame-gold",
    },
    ShopItem {
        id: "selo_stan",
        name: "Selo Stan",
        slot: CosmeticSlot::Badge,
        price: 150,
        value: "badge-stan",
    },
    ShopItem {
        id: "selo_bias",
        name: "Selo Bias",
        slot: CosmeticSlot::Badge,
        price: 300,
        value: "badge-bias",
    },
    ShopItem {
        id: "nome_rosa",
        name: "Nome Rosa",
        slot: CosmeticSlot::NameColor,
        price: 100,
        value: "#ff2d95",
    },
    ShopItem {
        id: "nome_roxo",
        name: "Nome Roxo",
        slot: CosmeticSlot::NameColor,
        price: 100,
        value: "#8e44ad",
    },
];

/// Look up a catalog item.
#[must_use]
pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    CATALOG.iter().find(|item| item.id == id)
}

/// Catalog entry as seen by one user.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub item: ShopItem,
    pub owned: bool,
    pub equipped: bool,
}

/// Shop page data.
#[derive(Debug, Clone, Serialize)]
pub struct ShopPage {
    pub points: Option<i64>,
    pub items: Vec<CatalogEntry>,
}

/// Shop service.
#[derive(Clone)]
pub struct ShopService {
    purchase_repo: PurchaseRepository,
    profile_repo: ProfileRepository,
    points: PointsService,
    id_gen: IdGenerator,
}

impl ShopService {
    /// Create a new shop service.
    #[must_use]
    pub const fn new(
        purchase_repo: PurchaseRepository,
        profile_repo: ProfileRepository,
        points: PointsService,
    ) -> Self {
        Self {
            purchase_repo,
            profile_repo,
            points,
            id_gen: IdGenerator::new(),
        }
    }

    /// The catalog with ownership flags for the viewer.
    pub async fn catalog(&self, user: Option<&profile::Model>) -> AppResult<ShopPage> {
        let owned: Vec<String> = match user {
            Some(u) => self
                .purchase_repo
                .find_by_user(&u.id)
                .await?
                .into_iter()
                .map(|p| p.item_id)
                .collect(),
            None => Vec::new(),
        };

        let items = CATALOG
            .iter()
            .map(|item| CatalogEntry {
                item: *item,
                owned: owned.iter().any(|id| id == item.id),
                equipped: user.is_some_and(|u| item.slot.equipped(u) == Some(item.id)),
            })
            .collect();

        Ok(ShopPage {
            points: user.map(|u| u.points),
            items,
        })
    }

    /// Buy an item: debit the price, then record the purchase, refunding on failure.
    pub async fn purchase(&self, user_id: &str, item_id: &str) -> AppResult<purchase::Model> {
        let item = find_item(item_id)
            .ok_or_else(|| AppError::NotFound(format!("item {item_id}")))?;

        if self.purchase_repo.owns(user_id, item.id).await? {
            return Err(AppError::Conflict("você já possui este item".to_string()));
        }

        self.points.spend(user_id, item.price).await?;

        let model = purchase::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            item_id: Set(item.id.to_string()),
            price: Set(item.price),
            created_at: Set(Utc::now().into()),
        };

        match self.purchase_repo.create(model).await {
            Ok(purchase) => {
                info!(user_id = %user_id, item_id = %item.id, price = item.price, "Item purchased");
                Ok(purchase)
            }
            Err(e) => {
                error!(error = %e, user_id = %user_id, item_id = %item.id, "Purchase insert failed, refunding");
                self.points.refund(user_id, item.price).await;
                Err(e)
            }
        }
    }

    /// Equip an owned item in its slot.
    pub async fn equip(&self, user_id: &str, item_id: &str) -> AppResult<&'static ShopItem> {
        let item = find_item(item_id)
            .ok_or_else(|| AppError::NotFound(format!("item {item_id}")))?;

        if !self.purchase_repo.owns(user_id, item.id).await? {
            return Err(AppError::Forbidden(
                "compre o item antes de equipá-lo".to_string(),
            ));
        }

        self.profile_repo
            .set_cosmetic(user_id, item.slot.column(), Some(item.id))
            .await?;
        Ok(item)
    }

    /// Clear a slot.
    pub async fn unequip(&self, user_id: &str, slot: CosmeticSlot) -> AppResult<()> {
        self.profile_repo
            .set_cosmetic(user_id, slot.column(), None)
            .await?;
        Ok(())
    }
}
