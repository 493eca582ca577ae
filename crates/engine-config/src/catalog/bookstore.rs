use model::{
    bson::doc,
    operation::{
        catalog::Catalog,
        spec::{FindOptions, OperationSpec, SortDirection, SortKey},
    },
};

pub const BOOKSTORE_CATALOG: &str = "bookstore";

/// The bookstore exercise: CRUD, advanced queries, aggregations and indexing
/// against `plp_bookstore.books`, in the order the exercise runs them.
pub fn bookstore_catalog() -> Catalog {
    let all = doc! {};
    let page_size = 5;

    Catalog::new(BOOKSTORE_CATALOG)
        // CRUD
        .with(OperationSpec::find("books_in_fiction", doc! { "genre": "Fiction" }))
        .with(OperationSpec::find(
            "published_after_1950",
            doc! { "published_year": { "$gt": 1950 } },
        ))
        .with(OperationSpec::find(
            "books_by_orwell",
            doc! { "author": "George Orwell" },
        ))
        .with(OperationSpec::update_one(
            "reprice_the_hobbit",
            doc! { "title": "The Hobbit" },
            doc! { "$set": { "price": 17.99 } },
        ))
        .with(OperationSpec::delete_one(
            "delete_moby_dick",
            doc! { "title": "Moby Dick" },
        ))
        // Advanced queries
        .with(OperationSpec::find(
            "in_stock_after_2010",
            doc! { "in_stock": true, "published_year": { "$gt": 2010 } },
        ))
        .with(OperationSpec::find_with(
            "title_author_price",
            all.clone(),
            FindOptions::default()
                .projection(doc! { "title": 1, "author": 1, "price": 1, "_id": 0 }),
        ))
        .with(OperationSpec::find_with(
            "price_ascending",
            all.clone(),
            FindOptions::default().sort_by("price", SortDirection::Ascending),
        ))
        .with(OperationSpec::find_with(
            "price_descending",
            all.clone(),
            FindOptions::default().sort_by("price", SortDirection::Descending),
        ))
        .with(OperationSpec::find_with(
            "page_1",
            all.clone(),
            FindOptions::default().limit(page_size),
        ))
        .with(OperationSpec::find_with(
            "page_2",
            all,
            FindOptions::default().skip(page_size as u64).limit(page_size),
        ))
        // Aggregation
        .with(OperationSpec::aggregate(
            "average_price_by_genre",
            vec![doc! { "$group": { "_id": "$genre", "avgPrice": { "$avg": "$price" } } }],
        ))
        .with(OperationSpec::aggregate(
            "author_with_most_books",
            vec![
                doc! { "$group": { "_id": "$author", "count": { "$sum": 1 } } },
                doc! { "$sort": { "count": -1 } },
                doc! { "$limit": 1 },
            ],
        ))
        .with(OperationSpec::aggregate(
            "books_by_decade",
            vec![
                doc! {
                    "$group": {
                        "_id": { "$multiply": [{ "$floor": { "$divide": ["$published_year", 10] } }, 10] },
                        "count": { "$sum": 1 },
                    }
                },
                doc! { "$sort": { "_id": 1 } },
            ],
        ))
        // Indexing
        .with(OperationSpec::create_index(
            "index_title",
            vec![SortKey::asc("title")],
        ))
        .with(OperationSpec::create_index(
            "index_author_published_year",
            vec![SortKey::asc("author"), SortKey::desc("published_year")],
        ))
        .with(OperationSpec::explain(
            "explain_title_search",
            doc! { "title": "1984" },
        ))
}
