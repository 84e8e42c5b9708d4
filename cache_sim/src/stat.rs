use std::fmt;

pub trait Stat {
    /// view of the stat fitting in `max_width` columns.
    fn view(&self, max_width: usize) -> Box<dyn StatView + '_>;
}

pub trait StatView: fmt::Display {
    /// header of stat
    fn header(&self) -> &'static str;
    /// body width
    fn width(&self) -> usize;
}

pub trait AddStats {
    /// add stat to `buf`.
    fn add_stats(&self, buf: &mut Stats);
}

#[derive(Default)]
pub struct Stats {
    stats: Vec<Box<dyn Stat>>,
}

impl Stats {
    pub fn push(&mut self, stat: Box<dyn Stat>) {
        self.stats.push(stat)
    }
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
    pub fn view(&self, max_width: usize) -> StatAllView<'_> {
        StatAllView {
            views: self.stats.iter().map(|s| s.view(max_width)).collect(),
            max_width,
        }
    }
}

pub struct StatAllView<'s> {
    views: Vec<Box<dyn StatView + 's>>,
    max_width: usize,
}

impl fmt::Display for StatAllView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .views
            .iter()
            .map(|s| s.header().len().max(s.width()))
            .max()
            .unwrap_or(0)
            .min(self.max_width);
        writeln!(f, "{:-^width$}", " statistics ")?;
        for sv in &self.views {
            writeln!(f, "{}:", sv.header())?;
            writeln!(f, "{}", sv)?;
        }
        write!(f, "{:-<width$}", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Count(usize);

    impl Stat for Count {
        fn view(&self, _: usize) -> Box<dyn StatView + '_> {
            Box::new(self)
        }
    }

    impl StatView for &'_ Count {
        fn header(&self) -> &'static str {
            "count"
        }
        fn width(&self) -> usize {
            20
        }
    }

    impl fmt::Display for &'_ Count {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "  total: {:>11}", self.0)
        }
    }

    #[test]
    fn test_frame() {
        let mut ss = Stats::default();
        assert!(ss.is_empty());
        ss.push(Box::new(Count(7)));
        let s = ss.view(80).to_string();
        let lines: Vec<_> = s.lines().collect();
        assert_eq!(lines[0], "---- statistics ----");
        assert_eq!(lines[1], "count:");
        assert_eq!(lines[2], "  total:           7");
        assert_eq!(lines[3], "--------------------");
        // frame is clipped to the available width
        let s = ss.view(12).to_string();
        assert_eq!(s.lines().last(), Some("------------"));
    }
}
