//! Fixture records for every entity kind, loaded by `POST /v1/generic/load-samples`.

use crate::error::AppError;
use crate::registry::EntityKind;
use crate::store::{EntityStore, Record};
use serde_json::{json, Value};

/// Sample rows of `kind`. Ids are explicit so references between kinds line up
/// and loading twice updates rather than duplicates.
pub fn samples(kind: EntityKind) -> Vec<Value> {
    match kind {
        EntityKind::ReportTopic => vec![
            json!({ "id": 1, "title": "Innovation news", "description": "Recent launches and announcements in a market" }),
            json!({ "id": 2, "title": "Competitor review", "description": "Deep dive into a single competitor" }),
            json!({ "id": 3, "title": "Competitors review", "description": "Side-by-side look at several competitors" }),
            json!({ "id": 4, "title": "Market analysis", "description": "Size, segments and trends of a market" }),
            json!({ "id": 5, "title": "Product comparison", "description": "Feature comparison between products" }),
        ],
        EntityKind::ReportTemplate => vec![
            json!({ "id": 1, "title": "Weekly innovation digest", "content": "## Highlights\n\n## Launches\n", "topicId": 1 }),
            json!({ "id": 2, "title": "Market overview", "content": "## Market size\n\n## Segments\n\n## Trends\n", "topicId": 4 }),
        ],
        EntityKind::Report => vec![
            json!({ "id": 1, "title": "EV charging market 2024", "content": "# EV charging market\n", "status": "ready", "templateId": 2, "topicId": 4 }),
            json!({ "id": 2, "title": "Battery tech weekly", "content": "# Battery tech\n", "templateId": 1, "topicId": 1 }),
        ],
        EntityKind::ReportSource => vec![
            json!({ "id": 1, "title": "IEA Global EV Outlook", "url": "https://www.iea.org/reports/global-ev-outlook-2024", "description": "Annual outlook on electric mobility", "reportId": 1 }),
            json!({ "id": 2, "title": "Charging network press release", "url": "https://example.com/press/charging", "description": "Operator expansion announcement", "reportId": 1 }),
            json!({ "id": 3, "title": "Solid-state battery paper", "url": "https://example.com/papers/solid-state", "description": "Preprint on solid-state cells", "reportId": 2 }),
        ],
        EntityKind::ReportSourceDocuments => vec![
            json!({ "id": 1, "title": "Outlook summary", "name": "outlook-summary.md", "mime": "text/markdown", "content": "EV sales grew strongly.", "reportSourceId": 1 }),
            json!({ "id": 2, "title": "Press release", "name": "press.html", "mime": "text/html", "content": "<p>New chargers</p>", "reportSourceId": 2 }),
        ],
    }
}

/// Save every sample, referenced kinds first. Returns the number of saved records.
pub async fn load_samples(store: &dyn EntityStore) -> Result<usize, AppError> {
    let mut saved = 0;
    for kind in EntityKind::ALL {
        for item in samples(kind) {
            let record: Record = match item {
                Value::Object(m) => m,
                _ => continue,
            };
            store.save(kind, &record).await?;
            saved += 1;
        }
    }
    tracing::info!(saved, "samples loaded");
    Ok(saved)
}
