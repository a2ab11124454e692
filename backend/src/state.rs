use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db;
use crate::error::StartupError;
use crate::interaction::InteractionService;
use crate::property::ListingService;
use crate::purchase::PurchaseLedger;
use crate::uploads::UploadStore;
use crate::wishlist::WishlistService;

/// Services shared by every handler, each built from the same configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub listings: ListingService,
    pub interactions: InteractionService,
    pub wishlist: WishlistService,
    pub purchases: PurchaseLedger,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let pool = db::establish_pool(&config)?;
        let uploads = UploadStore::new(&config.upload_dir)?;
        Ok(Self {
            auth: AuthService::new(pool.clone(), &config),
            listings: ListingService::new(pool.clone(), uploads),
            interactions: InteractionService::new(pool.clone()),
            wishlist: WishlistService::new(pool.clone()),
            purchases: PurchaseLedger::new(pool),
            config: Arc::new(config),
        })
    }
}
