// Tue Jan 20 2026 - Alex

use crate::config::ScanConfig;
use crate::memory::Region;
use crate::pattern::CompiledPattern;
use rayon::prelude::*;

/// Scans many regions for one pattern, splitting large regions into chunks that are searched
/// in parallel.
pub struct RegionScanner {
    config: ScanConfig,
    pool: Option<rayon::ThreadPool>,
}

/// A slice of a region. Only matches starting in `[start, start + owned)` belong to the chunk;
/// the rest of `data` is the overlap needed to finish matches that start near its end.
struct Chunk<'a> {
    base: u64,
    start: usize,
    owned: usize,
    data: &'a [u8],
}

impl RegionScanner {
    pub fn new(config: ScanConfig) -> Self {
        let pool = if config.parallel {
            match rayon::ThreadPoolBuilder::new().num_threads(config.threads).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("Failed to build scan thread pool, using the global pool: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self { config, pool }
    }

    /// Absolute addresses of the lowest `max_results` matches across `regions`, ascending.
    ///
    /// The sequential path stops as soon as the limit is reached, which only holds when regions
    /// do not overlap; overlapping regions are always scanned to the end.
    pub fn scan(&self, pattern: &CompiledPattern, regions: &[Region<'_>]) -> Vec<u64> {
        if self.config.max_results == 0 {
            return Vec::new();
        }
        self.run(pattern, regions, false).0
    }

    /// Like [`scan`](Self::scan), but also returns how many matches exist in total, including
    /// the ones past `max_results`.
    pub fn scan_with_total(&self, pattern: &CompiledPattern, regions: &[Region<'_>]) -> (Vec<u64>, usize) {
        self.run(pattern, regions, true)
    }

    pub fn find_first(&self, pattern: &CompiledPattern, regions: &[Region<'_>]) -> Option<u64> {
        let mut sorted = regions.to_vec();
        sorted.sort_by_key(|r| r.base());

        sorted.iter().find_map(|region| {
            pattern.matches(region.data())
                .map_while(|offset| region.base().checked_add(offset as u64))
                .next()
        })
    }

    fn run(&self, pattern: &CompiledPattern, regions: &[Region<'_>], count_all: bool) -> (Vec<u64>, usize) {
        let limit = self.config.max_results;
        let (chunks, disjoint) = self.chunks(pattern, regions);

        log::debug!(
            "Scanning {} regions in {} chunks for \"{}\"",
            regions.len(),
            chunks.len(),
            pattern
        );

        // Overlapping regions can report one address twice, so the per-chunk lists must be
        // complete for the dedup below to leave an exact count.
        let chunk_limit = if disjoint { limit } else { usize::MAX };
        let early_exit = disjoint && !count_all;

        let per_chunk = if self.config.parallel {
            let run = || {
                chunks.par_iter()
                    .map(|chunk| scan_chunk(pattern, chunk, chunk_limit, early_exit))
                    .collect::<Vec<_>>()
            };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        } else {
            let mut per_chunk = Vec::new();
            let mut found = 0usize;
            for chunk in &chunks {
                let (results, count) = scan_chunk(pattern, chunk, chunk_limit, early_exit);
                found = found.saturating_add(results.len());
                per_chunk.push((results, count));
                // Chunks are in address order, so nothing later can sort lower.
                if early_exit && found >= limit {
                    break;
                }
            }
            per_chunk
        };

        let counted: usize = per_chunk.iter().map(|(_, count)| *count).sum();
        let mut results: Vec<u64> = per_chunk.into_iter().flat_map(|(results, _)| results).collect();

        results.sort_unstable();
        results.dedup();
        let total = if disjoint { counted } else { results.len() };
        results.truncate(limit);

        log::debug!("Found {} matches for \"{}\"", total, pattern);

        (results, total)
    }

    /// Splits `regions` into chunks in address order. The flag is false when two regions share
    /// addresses.
    fn chunks<'a>(&self, pattern: &CompiledPattern, regions: &[Region<'a>]) -> (Vec<Chunk<'a>>, bool) {
        let chunk_size = self.config.chunk_size.max(1);
        let overlap = pattern.len() - 1;

        let mut sorted = regions.to_vec();
        sorted.sort_by_key(|r| r.base());

        let disjoint = sorted.windows(2).all(|pair| pair[0].end() <= pair[1].base());

        let mut chunks = Vec::new();
        for region in sorted {
            if self.config.skip_empty_regions && region.len() < pattern.len() {
                continue;
            }

            let data = region.data();
            let first = chunks.len();
            let mut start = 0;
            while start < data.len() {
                let owned = chunk_size.min(data.len() - start);
                let end = (start + owned).saturating_add(overlap).min(data.len());
                chunks.push(Chunk {
                    base: region.base(),
                    start,
                    owned,
                    data: &data[start..end],
                });
                start += owned;
            }

            log::trace!("{}: {} chunks", region, chunks.len() - first);
        }

        (chunks, disjoint)
    }
}

impl Default for RegionScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Returns up to `limit` addresses owned by `chunk` and the number of owned matches seen. With
/// `stop_at_limit` the scan ends once the list is full, so the count equals its length.
/// Matches whose address would pass `u64::MAX` are dropped.
fn scan_chunk(pattern: &CompiledPattern, chunk: &Chunk<'_>, limit: usize, stop_at_limit: bool) -> (Vec<u64>, usize) {
    let mut results = Vec::new();
    let mut count = 0;

    let addresses = pattern.matches(chunk.data)
        .take_while(|&offset| offset < chunk.owned)
        .map_while(|offset| chunk.base.checked_add((chunk.start + offset) as u64));

    for address in addresses {
        if results.len() < limit {
            results.push(address);
        } else if stop_at_limit {
            break;
        }
        count += 1;
    }

    (results, count)
}
