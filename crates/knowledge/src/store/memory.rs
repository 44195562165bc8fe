//! In-memory vector store for development and testing.
//!
//! Mirrors the Weaviate semantics the index manager relies on: classes must be
//! created before writes, records upsert by id, search ranks by cosine distance
//! and reports certainty as `1 - distance / 2`.

use super::{ClassDefinition, VectorStore, WhereFilter};
use crate::types::{DeleteSummary, QueryMatch, Record};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use vecbase_core::{AppError, AppResult};

#[derive(Debug, Clone)]
struct MemoryClass {
    definition: ClassDefinition,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    record: Record,
    /// Insertion sequence, used to break distance ties deterministically
    seq: u64,
}

/// In-memory vector store.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    classes: RwLock<HashMap<String, MemoryClass>>,
    schema_writes: AtomicUsize,
    object_writes: AtomicUsize,
    next_seq: AtomicUsize,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful class creations.
    pub fn schema_writes(&self) -> usize {
        self.schema_writes.load(Ordering::SeqCst)
    }

    /// Number of successful record writes (including overwrites).
    pub fn object_writes(&self) -> usize {
        self.object_writes.load(Ordering::SeqCst)
    }

    /// Schema definition of a class, if it exists.
    pub async fn class_definition(&self, class_name: &str) -> Option<ClassDefinition> {
        let classes = self.classes.read().await;
        classes.get(class_name).map(|c| c.definition.clone())
    }

    /// All records of a class in insertion order.
    pub async fn records(&self, class_name: &str) -> Vec<Record> {
        let classes = self.classes.read().await;
        let Some(class) = classes.get(class_name) else {
            return Vec::new();
        };

        let mut stored: Vec<&StoredObject> = class.objects.values().collect();
        stored.sort_by_key(|o| o.seq);
        stored.into_iter().map(|o| o.record.clone()).collect()
    }
}

/// Cosine distance (`1 - cos`). Zero vectors are maximally distant.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

#[async_trait::async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn list_classes(&self) -> AppResult<Vec<String>> {
        let classes = self.classes.read().await;
        let mut names: Vec<String> = classes.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_class(&self, class: &ClassDefinition) -> AppResult<()> {
        let mut classes = self.classes.write().await;
        if classes.contains_key(&class.class) {
            return Err(AppError::Schema(format!(
                "class name '{}' already exists",
                class.class
            )));
        }

        classes.insert(
            class.class.clone(),
            MemoryClass {
                definition: class.clone(),
                objects: BTreeMap::new(),
            },
        );
        self.schema_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_class(&self, class_name: &str) -> AppResult<()> {
        let mut classes = self.classes.write().await;
        classes.remove(class_name);
        Ok(())
    }

    async fn put_object(&self, record: &Record) -> AppResult<()> {
        let mut classes = self.classes.write().await;
        let class = classes.get_mut(&record.class).ok_or_else(|| {
            AppError::Write(format!("class '{}' not found", record.class))
        })?;

        // Overwrites keep their original position
        let seq = match class.objects.get(&record.id) {
            Some(existing) => existing.seq,
            None => self.next_seq.fetch_add(1, Ordering::SeqCst) as u64,
        };

        class.objects.insert(
            record.id.clone(),
            StoredObject {
                record: record.clone(),
                seq,
            },
        );
        self.object_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn near_vector(
        &self,
        class_name: &str,
        vector: &[f32],
        limit: usize,
    ) -> AppResult<Vec<QueryMatch>> {
        let classes = self.classes.read().await;
        let class = classes.get(class_name).ok_or_else(|| {
            AppError::Query(format!("Cannot query field \"{}\"", class_name))
        })?;

        let mut scored = Vec::with_capacity(class.objects.len());
        for stored in class.objects.values() {
            if stored.record.vector.len() != vector.len() {
                return Err(AppError::Query(format!(
                    "vector lengths don't match: {} vs {}",
                    vector.len(),
                    stored.record.vector.len()
                )));
            }
            let distance = cosine_distance(vector, &stored.record.vector);
            scored.push((distance, stored));
        }

        scored.sort_by(|(da, a), (db, b)| da.total_cmp(db).then(a.seq.cmp(&b.seq)));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(distance, stored)| {
                let props = &stored.record.properties;
                QueryMatch {
                    text: props.text.clone(),
                    fid: props.fid.clone(),
                    kid: props.kid.clone(),
                    doc_id: props.doc_id.clone(),
                    distance: Some(distance),
                    certainty: Some(1.0 - distance / 2.0),
                    id: Some(stored.record.id.clone()),
                }
            })
            .collect())
    }

    async fn delete_where(
        &self,
        class_name: &str,
        filter: &WhereFilter,
    ) -> AppResult<DeleteSummary> {
        let mut classes = self.classes.write().await;
        let class = classes.get_mut(class_name).ok_or_else(|| {
            AppError::Deletion(format!("class '{}' not found", class_name))
        })?;

        let before = class.objects.len();
        class
            .objects
            .retain(|_, stored| !filter.matches(&stored.record.properties));
        let deleted = (before - class.objects.len()) as u64;

        Ok(DeleteSummary {
            matches: deleted,
            successful: deleted,
            failed: 0,
        })
    }
}
