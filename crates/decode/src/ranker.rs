//! Ranker: finished groups to scored documents

use crate::pool::Group;
use rustc_hash::FxHashMap;
use setcode_core::DocId;
use setcode_index::TermSetIndex;

/// One ranked document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDoc {
    /// Corpus position of the document
    pub doc_id: DocId,
    /// Merged log-probability of the document's code
    pub score: f32,
}

/// Resolve finished groups to documents, best first
///
/// Every document on a group's leaf gets the group score, so canonical
/// collisions come out tied. A document reached through several groups
/// keeps its best score. Ties are broken by document id ascending, which is
/// corpus insertion order.
pub fn rank<'g, I>(index: &TermSetIndex, groups: I) -> Vec<RankedDoc>
where
    I: IntoIterator<Item = &'g Group>,
{
    let mut best: FxHashMap<DocId, f32> = FxHashMap::default();
    for group in groups.into_iter().filter(|g| g.finished) {
        let Some(docs) = index.leaves(&group.key) else {
            tracing::trace!(
                target: "setcode::decode",
                key = %group.key,
                "Finished group has no documents"
            );
            continue;
        };
        for &doc in docs {
            best.entry(doc)
                .and_modify(|s| *s = s.max(group.score))
                .or_insert(group.score);
        }
    }

    let mut ranked: Vec<RankedDoc> = best
        .into_iter()
        .map(|(doc_id, score)| RankedDoc { doc_id, score })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
    ranked
}
