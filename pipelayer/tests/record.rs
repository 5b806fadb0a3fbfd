use bson::doc;
use pipelayer::prelude::*;
use pretty_assertions::assert_eq;

#[allow(dead_code)]
#[derive(Debug, Record)]
#[record(collection = "orders")]
struct Order {
    #[record(id)]
    id: String,
    #[record(value = "cust_id")]
    customer: String,
    #[record(name = "qty")]
    quantity: i32,
    price: f64,
    r#type: String,
}

#[allow(dead_code)]
#[derive(Debug, Record)]
struct InventoryItem {
    sku: String,
    in_stock: i32,
}

#[test]
fn collection_names() {
    assert_eq!(Order::collection_name(), "orders");
    assert_eq!(InventoryItem::collection_name(), "inventoryItem");
}

#[test]
fn field_references_resolve_to_wire_names() {
    let pipeline = aggregation(|p| {
        p.project(|p| {
            p.include(OrderFields::id())
                .include(OrderFields::customer())
                .include(OrderFields::quantity())
                .include(OrderFields::price())
                .include(OrderFields::r#type());
        });
    });

    assert_eq!(
        pipeline.build().unwrap(),
        vec![doc! { "$project": { "_id": 1, "cust_id": 1, "qty": 1, "price": 1, "type": 1 } }]
    );
}

#[test]
fn records_drive_joins() {
    let pipeline = aggregation(|p| {
        p.lookup(|l| {
            l.from_record::<InventoryItem>()
                .local_field(OrderFields::customer())
                .foreign_field(InventoryItemFields::sku())
                .as_field("stock");
        });
        p.union_with(|u| {
            u.coll_of::<InventoryItem>();
        });
        p.match_(Filter::gt(OrderFields::quantity(), 0));
        p.group(|g| {
            g.id(OrderFields::customer())
                .accumulate("spent", |a| a.sum(OrderFields::price()));
        });
    });

    assert_eq!(
        pipeline.build().unwrap(),
        vec![
            doc! {
                "$lookup": {
                    "from": "inventoryItem",
                    "localField": "cust_id",
                    "foreignField": "sku",
                    "as": "stock",
                }
            },
            doc! { "$unionWith": { "coll": "inventoryItem" } },
            doc! { "$match": { "qty": { "$gt": 0 } } },
            doc! { "$group": { "_id": "$cust_id", "spent": { "$sum": "$price" } } },
        ]
    );
}

#[test]
fn nested_properties_join_with_dots() {
    let path = Property::new("shipping").nested(InventoryItemFields::in_stock());

    let pipeline = aggregation(|p| {
        p.sort(|s| {
            s.ascending(path);
        });
    });

    assert_eq!(
        pipeline.build().unwrap(),
        vec![doc! { "$sort": { "shipping.in_stock": 1 } }]
    );
}
