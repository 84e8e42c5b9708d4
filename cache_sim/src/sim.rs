use serde::Serialize;

use crate::{
    addr::Addr,
    cache::{Access, Cache, Slot},
    config::{CacheConfig, Result},
};

#[cfg(feature = "stat")]
use crate::stat::{AddStats, Stats};

/// State of every line right after one access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<Slot>);

impl std::ops::Deref for Snapshot {
    type Target = [Slot];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub hits: usize,
    pub misses: usize,
    /// one snapshot per access, in trace order
    pub history: Vec<Snapshot>,
}

impl RunResult {
    pub fn accesses(&self) -> usize {
        self.hits + self.misses
    }
}

pub struct Simulator {
    cache: Cache,
    hits: usize,
    misses: usize,
    history: Vec<Snapshot>,
    #[cfg(feature = "stat")]
    stat_builder: stat::CacheStatBuilder,
}

impl Simulator {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let cache = Cache::new(config)?;
        let geometry = *cache.geometry();
        log::info!(
            "{}: {} lines of {} bytes, {} sets, {} mapping, {} lookup",
            geometry.organization(),
            geometry.total_lines,
            config.line_size,
            geometry.set_count,
            config.mapping,
            config.lookup,
        );
        Ok(Self {
            cache,
            hits: 0,
            misses: 0,
            history: Vec::new(),
            #[cfg(feature = "stat")]
            stat_builder: stat::CacheStatBuilder::new(&geometry),
        })
    }
    pub fn cache(&self) -> &Cache {
        &self.cache
    }
    pub fn hits(&self) -> usize {
        self.hits
    }
    pub fn misses(&self) -> usize {
        self.misses
    }
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    /// replays one address and records the resulting cache state.
    pub fn step(&mut self, addr: Addr) -> Access {
        let access = self.cache.access(addr);
        log::debug!("{addr}: {access}");
        if access.is_hit() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        #[cfg(feature = "stat")]
        self.stat_builder.record(&access);
        self.history.push(Snapshot(self.cache.slots().to_vec()));
        access
    }
    pub fn run(&mut self, trace: &[Addr]) {
        self.history.reserve(trace.len());
        for &addr in trace {
            self.step(addr);
        }
        log::info!(
            "replayed {} accesses: {} hits, {} misses",
            trace.len(),
            self.hits,
            self.misses
        );
    }
    pub fn into_result(self) -> RunResult {
        RunResult {
            hits: self.hits,
            misses: self.misses,
            history: self.history,
        }
    }
}

/// runs `trace` through a fresh cache built from `config`.
pub fn simulate(config: &CacheConfig, trace: &[Addr]) -> Result<RunResult> {
    let mut sim = Simulator::new(config)?;
    sim.run(trace);
    Ok(sim.into_result())
}

#[cfg(feature = "stat")]
impl Simulator {
    pub fn collect_stat(&self) -> Stats {
        let mut ss = Stats::default();
        self.add_stats(&mut ss);
        ss
    }
}

#[cfg(feature = "stat")]
impl AddStats for Simulator {
    fn add_stats(&self, buf: &mut Stats) {
        buf.push(Box::new(self.stat_builder.finish(self.hits, self.misses)));
    }
}

#[cfg(feature = "stat")]
mod stat {
    use std::fmt;

    use crate::{
        cache::Access,
        config::{Geometry, Organization},
        stat::*,
    };

    const CELL_WIDTH: usize = 12;

    pub struct CacheStatBuilder {
        organization: Organization,
        set_size: usize,
        cold_fills: usize,
        evictions: Vec<usize>,
    }

    impl CacheStatBuilder {
        pub fn new(geometry: &Geometry) -> Self {
            Self {
                organization: geometry.organization(),
                set_size: geometry.set_size,
                cold_fills: 0,
                evictions: vec![0; geometry.set_count],
            }
        }
        pub fn record(&mut self, access: &Access) {
            match access {
                Access::Hit { .. } => {}
                Access::Miss { evicted: None, .. } => self.cold_fills += 1,
                Access::Miss { slot, .. } => self.evictions[slot / self.set_size] += 1,
            }
        }
        pub fn finish(&self, hits: usize, misses: usize) -> CacheStat {
            CacheStat {
                organization: self.organization,
                set_size: self.set_size,
                hits,
                misses,
                cold_fills: self.cold_fills,
                evictions: self.evictions.clone(),
            }
        }
    }

    pub struct CacheStat {
        organization: Organization,
        set_size: usize,
        hits: usize,
        misses: usize,
        cold_fills: usize,
        evictions: Vec<usize>,
    }

    impl CacheStat {
        pub fn hit_rate(&self) -> Option<f64> {
            let accesses = self.hits + self.misses;
            (accesses != 0).then(|| self.hits as f64 / accesses as f64)
        }
    }

    pub struct CacheStatView<'a> {
        stat: &'a CacheStat,
        per_row: usize,
    }

    impl Stat for CacheStat {
        fn view(&self, max_width: usize) -> Box<dyn StatView + '_> {
            Box::new(CacheStatView {
                stat: self,
                per_row: (max_width / CELL_WIDTH).max(1),
            })
        }
    }

    impl StatView for CacheStatView<'_> {
        fn header(&self) -> &'static str {
            "cache stat"
        }
        fn width(&self) -> usize {
            let cells = self.per_row.min(self.stat.evictions.len());
            (cells * CELL_WIDTH).max(32)
        }
    }

    impl fmt::Display for CacheStatView<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let s = self.stat;
            writeln!(f, "  {}", s.organization)?;
            let lines = format!("{} x {}", s.evictions.len(), s.set_size);
            writeln!(f, "  sets x ways: {lines:>17}")?;
            writeln!(f, "  accesses: {:>19}", s.hits + s.misses)?;
            writeln!(f, "  hits: {:>23}", s.hits)?;
            writeln!(f, "  misses: {:>21}", s.misses)?;
            writeln!(f, "    cold: {:>21}", s.cold_fills)?;
            let evictions: usize = s.evictions.iter().sum();
            writeln!(f, "    evictions: {evictions:>16}")?;
            let rate = match s.hit_rate() {
                Some(r) => format!("{:.2} %", r * 100.0),
                None => "-".to_owned(),
            };
            write!(f, "  hit rate: {rate:>19}")?;
            if s.evictions.len() > 1 {
                write!(f, "\n  evictions per set:")?;
                for (i, n) in s.evictions.iter().enumerate() {
                    if i % self.per_row == 0 {
                        writeln!(f)?;
                    }
                    write!(f, "  {i:03}:{n:>6}")?;
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        addr::BlockId,
        config::{LookupScope, MappingDirection},
    };

    fn trace(v: &[u32]) -> Vec<Addr> {
        v.iter().copied().map(Addr::new).collect()
    }

    fn resident(s: &Snapshot) -> Vec<Option<u32>> {
        s.iter().map(|l| l.block().map(BlockId::into_inner)).collect()
    }

    #[test]
    fn test_fully_associative_scenario() {
        let config = CacheConfig::new(1024, 16, 64);
        let r = simulate(&config, &trace(&[0x00, 0x10, 0x00])).unwrap();
        assert_eq!(r.hits, 1);
        assert_eq!(r.misses, 2);
        assert_eq!(r.history.len(), 3);
        assert!(r.history.iter().all(|s| s.len() == 64));
        assert_eq!(resident(&r.history[0])[..3], [Some(0), None, None]);
        assert_eq!(resident(&r.history[1])[..3], [Some(0), Some(1), None]);
        assert_eq!(r.history[1], r.history[2]);
    }
    #[test]
    fn test_direct_mapped_conflicts() {
        // 4 lines of 16 bytes; every address below maps to line 0
        let config = CacheConfig::new(64, 16, 1);
        let addrs = [0x000, 0x040, 0x080, 0x0C0, 0x100];
        let r = simulate(&config, &trace(&addrs)).unwrap();
        assert_eq!(r.hits, 0);
        assert_eq!(r.misses, 5);
        for (s, a) in r.history.iter().zip(addrs) {
            assert_eq!(resident(s), [Some(a >> 4), None, None, None]);
        }
    }
    #[test]
    fn test_direct_mapped_repeat_hits() {
        let config = CacheConfig::new(64, 16, 1);
        // 0x10 and 0x20 map to other lines than 0x04
        let r = simulate(&config, &trace(&[0x04, 0x10, 0x08, 0x20, 0x0C])).unwrap();
        assert_eq!((r.hits, r.misses), (2, 3));
    }
    #[test]
    fn test_fifo_order_full_cache() {
        // fully associative, 4 lines: the fifth distinct block evicts the first
        let config = CacheConfig::new(64, 16, 4);
        let mut sim = Simulator::new(&config).unwrap();
        for b in 0..4 {
            sim.step(Addr::new(b << 4));
        }
        assert!(sim.cache().slots().iter().all(Slot::is_valid));
        let a = sim.step(Addr::new(4 << 4));
        assert_eq!(
            a,
            Access::Miss {
                slot: 0,
                evicted: Some(BlockId::new(0))
            }
        );
        // block 1 is now the earliest admitted
        let a = sim.step(Addr::new(5 << 4));
        assert_eq!(
            a,
            Access::Miss {
                slot: 1,
                evicted: Some(BlockId::new(1))
            }
        );
        assert!(sim.step(Addr::new(4 << 4)).is_hit());
        assert_eq!(sim.hits() + sim.misses(), sim.history().len());
    }
    #[test]
    fn test_no_eviction_before_full() {
        let config = CacheConfig::new(128, 16, 8);
        let mut sim = Simulator::new(&config).unwrap();
        for b in [3u32, 9, 3, 12, 40, 9, 77, 5, 6, 2] {
            let a = sim.step(Addr::new(b << 4));
            if let Access::Miss {
                evicted: Some(_), ..
            } = a
            {
                panic!("evicted while lines were free");
            }
        }
        let a = sim.step(Addr::new(100 << 4));
        assert_eq!(
            a,
            Access::Miss {
                slot: 0,
                evicted: Some(BlockId::new(3))
            }
        );
    }
    #[test]
    fn test_set_associative_mapping_directions() {
        // 8 lines, 2 ways, 4 sets
        let addrs = trace(&[0x00, 0x40, 0x80, 0x10]);
        let forward = simulate(&CacheConfig::new(128, 16, 2), &addrs).unwrap();
        let last = resident(forward.history.last().unwrap());
        assert_eq!(
            last,
            [Some(8), Some(4), Some(1), None, None, None, None, None]
        );
        let reverse = CacheConfig::new(128, 16, 2).with_mapping(MappingDirection::Reverse);
        let reverse = simulate(&reverse, &addrs).unwrap();
        let last = resident(reverse.history.last().unwrap());
        assert_eq!(
            last,
            [None, None, None, None, Some(1), None, Some(8), Some(4)]
        );
        assert_eq!((forward.hits, forward.misses), (reverse.hits, reverse.misses));
    }
    #[test]
    fn test_lookup_scope_same_result() {
        let addrs = trace(&[0x00, 0x40, 0x80, 0x10, 0x00, 0x40, 0x90, 0x10]);
        let config = CacheConfig::new(128, 16, 2);
        let global = simulate(&config, &addrs).unwrap();
        let local = simulate(&config.with_lookup(LookupScope::Set), &addrs).unwrap();
        assert_eq!(global, local);
    }
    #[test]
    fn test_idempotent() {
        let config = CacheConfig::new(256, 32, 2);
        let addrs = trace(&[0x1234, 0xABCD, 0x1240, 0xFFFF_FFFF, 0x0, 0xABC0, 0x4000]);
        assert_eq!(
            simulate(&config, &addrs).unwrap(),
            simulate(&config, &addrs).unwrap()
        );
    }
    #[test]
    fn test_empty_trace() {
        let r = simulate(&CacheConfig::new(64, 16, 1), &[]).unwrap();
        assert_eq!(r.accesses(), 0);
        assert!(r.history.is_empty());
    }
    #[test]
    fn test_invalid_config() {
        assert!(Simulator::new(&CacheConfig::new(64, 16, 3)).is_err());
    }

    #[cfg(feature = "stat")]
    #[test]
    fn test_stat() {
        let config = CacheConfig::new(64, 16, 1);
        let mut sim = Simulator::new(&config).unwrap();
        sim.run(&trace(&[0x00, 0x40, 0x00, 0x10, 0x10]));
        let stats = sim.collect_stat();
        assert!(!stats.is_empty());
        let view = stats.view(80).to_string();
        assert!(view.contains("direct-mapped"));
        assert!(view.contains("  hits: "));
        assert!(view.contains("20.00 %"));
        assert!(view.contains("  000:     2  001:     0"));
    }
}
