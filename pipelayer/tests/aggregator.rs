use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::{Document, doc};
use pipelayer::prelude::*;
use pretty_assertions::assert_eq;
use serde::Deserialize;

#[derive(Debug, Default)]
struct StubExecutor {
    seen: Mutex<Vec<(String, Vec<Document>)>>,
    rows: Vec<Document>,
}

#[async_trait]
impl AggregationExecutor for StubExecutor {
    async fn run_aggregation(
        &self,
        pipeline: Vec<Document>,
        collection: &str,
        _options: AggregateOptions,
    ) -> AggregationResult<Vec<Document>> {
        self.seen
            .lock()
            .map_err(|e| AggregationError::Backend(e.to_string()))?
            .push((collection.to_string(), pipeline));
        Ok(self.rows.clone())
    }
}

#[derive(Debug)]
struct StubExecutorBuilder {
    rows: Vec<Document>,
}

#[async_trait]
impl ExecutorBuilder for StubExecutorBuilder {
    type Executor = StubExecutor;

    async fn build(self) -> AggregationResult<Self::Executor> {
        Ok(StubExecutor { rows: self.rows, ..Default::default() })
    }
}

#[allow(dead_code)]
#[derive(Debug, Record)]
#[record(collection = "sales")]
struct Sale {
    item: String,
    price: f64,
    quantity: i32,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ItemTotal {
    #[serde(rename = "_id")]
    item: String,
    revenue: f64,
}

#[tokio::test]
async fn typed_results_from_a_built_executor() {
    let executor = StubExecutorBuilder {
        rows: vec![
            doc! { "_id": "abc", "revenue": 170.0 },
            doc! { "_id": "jkl", "revenue": 20.0 },
        ],
    }
    .build()
    .await
    .unwrap();
    let executor = Arc::new(executor);
    let aggregator = Aggregator::new(Arc::clone(&executor));

    let totals: Vec<ItemTotal> = aggregator
        .aggregate::<Sale, _>(|p| {
            p.group(|g| {
                g.id(SaleFields::item()).accumulate("revenue", |a| {
                    a.sum(Operand::expression(|e| {
                        e.multiply(|m| m.of(SaleFields::price()).times(SaleFields::quantity()))
                    }))
                });
            });
            p.sort(|s| {
                s.descending("revenue");
            });
        })
        .await
        .unwrap();

    assert_eq!(
        totals,
        vec![
            ItemTotal { item: "abc".into(), revenue: 170.0 },
            ItemTotal { item: "jkl".into(), revenue: 20.0 },
        ]
    );

    let seen = executor.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "sales");
    assert_eq!(
        seen[0].1,
        vec![
            doc! {
                "$group": {
                    "_id": "$item",
                    "revenue": { "$sum": { "$multiply": ["$price", "$quantity"] } },
                }
            },
            doc! { "$sort": { "revenue": -1 } },
        ]
    );
}

#[tokio::test]
async fn prebuilt_pipelines_run_against_any_collection() {
    let executor = StubExecutor {
        rows: vec![doc! { "total": 3 }],
        ..Default::default()
    };
    let pipeline = aggregation(|p| {
        p.match_(Filter::exists("item"));
        p.count("total");
    });

    let aggregator = Aggregator::new(&executor);
    let rows: Vec<Document> = aggregator.aggregate_pipeline(&pipeline, "archive").await.unwrap();

    assert_eq!(rows, vec![doc! { "total": 3 }]);
    assert_eq!(
        executor.seen.lock().unwrap()[0],
        (
            "archive".to_string(),
            vec![
                doc! { "$match": { "item": { "$exists": true } } },
                doc! { "$count": "total" },
            ]
        )
    );
}

#[tokio::test]
async fn shutdown_defaults_to_a_no_op() {
    let aggregator = Aggregator::new(StubExecutor::default());

    aggregator.shutdown().await.unwrap();
}
