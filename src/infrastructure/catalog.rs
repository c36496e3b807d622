//! Built-in Listing Catalog
//!
//! Seeds the market with a fixed set of Bollywood titles. Listing prices and
//! issued shares are randomized per run within the same bands the production
//! data loader used; the engine itself never depends on where a price starts.

use crate::domain::trading::stock::{Stock, StockMetadata};
use crate::infrastructure::market_store::MarketStore;
use anyhow::Result;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::info;

struct SeedMovie {
    title: &'static str,
    synopsis: &'static str,
    cast: &'static [&'static str],
    release_date: &'static str,
    genres: &'static [&'static str],
}

const SEED_MOVIES: &[SeedMovie] = &[
    SeedMovie {
        title: "Fighter",
        synopsis: "An aerial action thriller featuring India's elite fighter pilots protecting the nation.",
        cast: &["Hrithik Roshan", "Deepika Padukone", "Anil Kapoor"],
        release_date: "2024-01-25",
        genres: &["Action", "Thriller"],
    },
    SeedMovie {
        title: "Bade Miyan Chote Miyan",
        synopsis: "Two elite soldiers team up for a dangerous mission to save the country.",
        cast: &["Akshay Kumar", "Tiger Shroff", "Prithviraj Sukumaran"],
        release_date: "2024-04-10",
        genres: &["Action", "Comedy"],
    },
    SeedMovie {
        title: "Crew",
        synopsis: "Three air hostesses get caught up in a gold smuggling racket.",
        cast: &["Kareena Kapoor Khan", "Tabu", "Kriti Sanon"],
        release_date: "2024-03-29",
        genres: &["Comedy", "Drama"],
    },
    SeedMovie {
        title: "Singham Again",
        synopsis: "The iconic cop Bajirao Singham returns for another action-packed mission.",
        cast: &["Ajay Devgn", "Kareena Kapoor Khan", "Deepika Padukone"],
        release_date: "2024-11-01",
        genres: &["Action", "Drama"],
    },
    SeedMovie {
        title: "Pushpa 2: The Rule",
        synopsis: "Pushpa Raj's journey continues as he faces new enemies and challenges.",
        cast: &["Allu Arjun", "Rashmika Mandanna", "Fahadh Faasil"],
        release_date: "2024-08-15",
        genres: &["Action", "Thriller"],
    },
    SeedMovie {
        title: "Stree 2",
        synopsis: "The horror-comedy sequel brings back the ghost of Stree with new twists.",
        cast: &["Shraddha Kapoor", "Rajkummar Rao", "Pankaj Tripathi"],
        release_date: "2024-08-15",
        genres: &["Horror", "Comedy"],
    },
    SeedMovie {
        title: "War 2",
        synopsis: "The action-packed sequel to the blockbuster War with new missions.",
        cast: &["Hrithik Roshan", "Jr NTR", "Deepika Padukone"],
        release_date: "2025-08-14",
        genres: &["Action", "Thriller"],
    },
    SeedMovie {
        title: "Jigra",
        synopsis: "A sister's fight to save her brother from a foreign prison.",
        cast: &["Alia Bhatt", "Vedang Raina"],
        release_date: "2024-10-11",
        genres: &["Drama", "Thriller"],
    },
    SeedMovie {
        title: "Sikandar",
        synopsis: "An action-packed thriller with Salman Khan in the lead.",
        cast: &["Salman Khan", "Rashmika Mandanna"],
        release_date: "2025-03-27",
        genres: &["Action", "Thriller"],
    },
    SeedMovie {
        title: "Pathaan 2",
        synopsis: "RAW agent Pathaan returns for another thrilling mission.",
        cast: &["Shah Rukh Khan", "Deepika Padukone", "John Abraham"],
        release_date: "2025-11-04",
        genres: &["Action", "Thriller"],
    },
    SeedMovie {
        title: "Brahmastra Part Two: Dev",
        synopsis: "The Astraverse saga continues with the story of Dev.",
        cast: &["Ranbir Kapoor", "Alia Bhatt", "Deepika Padukone"],
        release_date: "2025-12-25",
        genres: &["Fantasy", "Action"],
    },
    SeedMovie {
        title: "Jolly LLB 3",
        synopsis: "The courtroom comedy-drama returns with more legal battles and humor.",
        cast: &["Akshay Kumar", "Arshad Warsi"],
        release_date: "2025-09-19",
        genres: &["Comedy", "Drama"],
    },
];

/// List the seed catalog into an empty store. Prices land between 60.00 and
/// 450.00, issued shares between 50k and 200k, matching the original loader.
pub async fn seed_catalog(store: &MarketStore) -> Result<usize> {
    let mut listed = 0;
    for movie in SEED_MOVIES {
        let (price, shares) = {
            let mut rng = rand::rng();
            let cents: i64 = rng.random_range(6_000..=45_000);
            let shares: u64 = rng.random_range(50_000..=200_000);
            (Decimal::new(cents, 2), shares)
        };

        let metadata = StockMetadata {
            poster: None,
            release_date: Some(movie.release_date.to_string()),
            synopsis: Some(movie.synopsis.to_string()),
            genres: movie.genres.iter().map(|g| g.to_string()).collect(),
            cast: movie.cast.iter().map(|c| c.to_string()).collect(),
        };

        let stock = Stock::new(movie.title, price, shares, metadata);
        info!("Listed {} ({}) at {}", stock.title, stock.symbol, price);
        store.insert_stock(stock).await?;
        listed += 1;
    }
    Ok(listed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_seed_catalog_lists_every_movie_once() {
        let store = MarketStore::new();

        let listed = seed_catalog(&store).await.unwrap();

        assert_eq!(listed, SEED_MOVIES.len());
        assert_eq!(store.stock_count().await, SEED_MOVIES.len());
    }

    #[tokio::test]
    async fn test_seed_prices_within_listing_band() {
        let store = MarketStore::new();
        seed_catalog(&store).await.unwrap();

        for stock in store.stock_snapshots().await {
            assert!(stock.current_price >= dec!(60));
            assert!(stock.current_price <= dec!(450));
            assert!(stock.total_shares >= 50_000 && stock.total_shares <= 200_000);
            assert_eq!(stock.volume, 0);
            assert_eq!(stock.previous_close, stock.current_price);
        }
    }

    #[tokio::test]
    async fn test_seed_symbols_are_unique() {
        // Symbol derivation caps at six chars; the seed list must not collide.
        let store = MarketStore::new();
        seed_catalog(&store).await.unwrap();

        let snapshots = store.stock_snapshots().await;
        let mut symbols: Vec<String> = snapshots.iter().map(|s| s.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        assert_eq!(symbols.len(), snapshots.len());
    }
}
