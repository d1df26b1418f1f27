//! Seeded fixture corpus generator.
//!
//! One corpus feeds both engines: the tuple store loads [`Corpus::tuple_batches`]
//! and the flattened ACL loads the same graph plus [`Corpus::row_batches`].
//! Generation is deterministic for a given [`CorpusSettings`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use permbench_domain::model::{AclRow, OrgGraph, Owner, RelationTuple};

use crate::config::CorpusSettings;
use crate::error::{HarnessError, HarnessResult};

/// A generated organization corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub settings: CorpusSettings,
    pub generated_at: DateTime<Utc>,
    pub graph: OrgGraph,
}

/// Entity and relation counts of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub departments: usize,
    pub users: usize,
    pub customers: usize,
    pub documents: usize,
    pub tree_depth: u32,
    pub tuples: usize,
    pub rows: usize,
}

impl Corpus {
    /// Generates a corpus from `settings`.
    ///
    /// - departments form trees no deeper than `max_depth`;
    /// - every user is a direct member of exactly one department, and no
    ///   department exceeds `max_department_size`;
    /// - every customer has at most `max_followers` distinct followers;
    /// - every document has exactly one owner.
    #[instrument(skip_all, fields(seed = settings.seed))]
    pub fn generate(settings: &CorpusSettings) -> HarnessResult<Self> {
        if settings.documents > 0 && settings.departments == 0 && settings.customers == 0 {
            return Err(HarnessError::InvalidCorpus {
                message: "documents need at least one department or customer to own them"
                    .to_string(),
            });
        }

        let mut rng = StdRng::seed_from_u64(settings.seed);
        let mut graph = OrgGraph::new(settings.max_depth);

        for id in 1..=settings.departments {
            let parent = if id == 1 {
                None
            } else {
                pick_parent(&graph, rng.gen_range(1..id), settings.max_depth)
            };
            graph.add_department(id, parent)?;
        }

        assign_users(&mut graph, settings, &mut rng)?;

        for customer in 1..=settings.customers {
            graph.add_customer(customer);
            let most = settings.max_followers.min(settings.users);
            let count = rng.gen_range(0..=most) as usize;
            for offset in index::sample(&mut rng, settings.users as usize, count) {
                graph.add_follower(customer, offset as u64 + 1)?;
            }
        }

        for document in 1..=settings.documents {
            let customer_owned = settings.departments == 0
                || (settings.customers > 0 && rng.gen_bool(settings.customer_owned_ratio));
            let owner = if customer_owned {
                Owner::Customer(rng.gen_range(1..=settings.customers))
            } else {
                Owner::Department(rng.gen_range(1..=settings.departments))
            };
            graph.add_document(document, owner)?;
        }

        info!(
            departments = graph.department_count(),
            users = graph.user_count(),
            customers = graph.customer_count(),
            documents = graph.document_count(),
            tree_depth = graph.tree_depth(),
            "corpus generated"
        );

        Ok(Self {
            settings: settings.clone(),
            generated_at: Utc::now(),
            graph,
        })
    }

    /// Tuple-store form, in batches of `batch_size`.
    pub fn tuple_batches(&self) -> impl Iterator<Item = Vec<RelationTuple>> + '_ {
        batched(self.graph.tuples(), self.settings.batch_size)
    }

    /// Pre-flattened rows, in batches of `batch_size`.
    pub fn row_batches(&self) -> impl Iterator<Item = Vec<AclRow>> + '_ {
        batched(self.graph.acl_rows(), self.settings.batch_size)
    }

    pub fn summary(&self) -> CorpusSummary {
        CorpusSummary {
            departments: self.graph.department_count(),
            users: self.graph.user_count(),
            customers: self.graph.customer_count(),
            documents: self.graph.document_count(),
            tree_depth: self.graph.tree_depth(),
            tuples: self.graph.tuples().count(),
            rows: self.graph.acl_rows().count(),
        }
    }

    /// Writes the corpus as JSON.
    pub fn save(&self, path: &Path) -> HarnessResult<()> {
        let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|e| HarnessError::io(path, e))?;
        info!(path = %path.display(), "corpus saved");
        Ok(())
    }

    /// Reads a corpus written by [`Corpus::save`].
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let file = File::open(path).map_err(|e| HarnessError::io(path, e))?;
        let corpus: Corpus = serde_json::from_reader(BufReader::new(file))?;
        if corpus.settings.batch_size == 0 {
            return Err(HarnessError::InvalidCorpus {
                message: "batch_size must be greater than 0".to_string(),
            });
        }
        info!(
            path = %path.display(),
            documents = corpus.graph.document_count(),
            "corpus loaded"
        );
        Ok(corpus)
    }
}

/// Walks up from `candidate` to the first department that can take a child.
fn pick_parent(graph: &OrgGraph, candidate: u64, max_depth: u32) -> Option<u64> {
    let mut cursor = Some(candidate);
    while let Some(id) = cursor {
        match graph.department(id) {
            Some(department) if department.depth < max_depth => return Some(id),
            Some(department) => cursor = department.parent,
            None => return None,
        }
    }
    None
}

/// Places every user in one department, probing forward from a random
/// start when the drawn department is full.
fn assign_users(
    graph: &mut OrgGraph,
    settings: &CorpusSettings,
    rng: &mut StdRng,
) -> HarnessResult<()> {
    if settings.users == 0 {
        return Ok(());
    }
    if settings.users > settings.departments.saturating_mul(settings.max_department_size) {
        return Err(HarnessError::InvalidCorpus {
            message: format!(
                "{} users do not fit {} departments of at most {} members",
                settings.users, settings.departments, settings.max_department_size
            ),
        });
    }

    let departments = settings.departments as usize;
    let mut sizes = vec![0u64; departments];
    for user in 1..=settings.users {
        graph.add_user(user);
        let start = rng.gen_range(0..departments);
        let slot = (0..departments)
            .map(|probe| (start + probe) % departments)
            .find(|slot| sizes[*slot] < settings.max_department_size)
            .ok_or_else(|| HarnessError::InvalidCorpus {
                message: "no department has room left".to_string(),
            })?;
        sizes[slot] += 1;
        graph.add_member(slot as u64 + 1, user)?;
    }
    Ok(())
}

/// Splits `items` into vectors of at most `size` elements.
fn batched<T>(mut items: impl Iterator<Item = T>, size: usize) -> impl Iterator<Item = Vec<T>> {
    let size = size.max(1);
    std::iter::from_fn(move || {
        let batch: Vec<T> = items.by_ref().take(size).collect();
        (!batch.is_empty()).then_some(batch)
    })
}
