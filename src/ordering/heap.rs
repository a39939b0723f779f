use crate::directory::Reservation;
use crate::error::ClinicError;

/// Array-backed binary min-heap of borrowed reservations keyed by
/// (date, time). Grows on demand unless built with a capacity limit, in which
/// case overflow is an error rather than a silent drop.
#[derive(Debug, Default)]
pub struct ReportHeap<'a> {
    items: Vec<&'a Reservation>,
    limit: Option<usize>,
}

impl<'a> ReportHeap<'a> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            limit: None,
        }
    }

    pub fn bounded(limit: usize) -> Self {
        Self {
            items: Vec::with_capacity(limit),
            limit: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.items[a].report_key() < self.items[b].report_key()
    }

    pub fn insert(&mut self, reservation: &'a Reservation) -> Result<(), ClinicError> {
        if let Some(limit) = self.limit {
            if self.items.len() >= limit {
                return Err(ClinicError::CapacityExceeded(limit));
            }
        }
        self.items.push(reservation);
        self.sift_up(self.items.len() - 1);
        Ok(())
    }

    pub fn extract_min(&mut self) -> Option<&'a Reservation> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let min = self.items.pop();
        self.sift_down(0);
        min
    }

    pub fn peek(&self) -> Option<&'a Reservation> {
        self.items.first().copied()
    }

    fn sift_up(&mut self, mut child: usize) {
        while child > 0 {
            let parent = (child - 1) / 2;
            if !self.less(child, parent) {
                break;
            }
            self.items.swap(child, parent);
            child = parent;
        }
    }

    fn sift_down(&mut self, mut parent: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * parent + 1;
            let right = left + 1;
            if left >= len {
                break;
            }
            let smaller = if right < len && self.less(right, left) {
                right
            } else {
                left
            };
            if !self.less(smaller, parent) {
                break;
            }
            self.items.swap(smaller, parent);
            parent = smaller;
        }
    }

    /// Extracts everything, yielding reservations in non-decreasing
    /// (date, time) order
    pub fn drain_sorted(mut self) -> impl Iterator<Item = &'a Reservation> {
        std::iter::from_fn(move || self.extract_min())
    }

    #[cfg(test)]
    fn is_heap(&self) -> bool {
        (1..self.items.len()).all(|i| !self.less(i, (i - 1) / 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn res(date: String, time: String) -> Reservation {
        Reservation {
            date,
            time,
            doctor: "d".into(),
            patient: "p".into(),
            notes: String::new(),
        }
    }

    #[test]
    fn extracts_in_order_then_reports_empty() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut data: Vec<_> = (0..250)
            .map(|_| {
                res(
                    format!("2025-{:02}-{:02}", rng.gen_range(1..=12), rng.gen_range(1..=28)),
                    format!("{:02}:{:02}", rng.gen_range(0..24), rng.gen_range(0..60)),
                )
            })
            .collect();
        data.shuffle(&mut rng);

        let mut heap = ReportHeap::new();
        for r in &data {
            heap.insert(r).unwrap();
            assert!(heap.is_heap());
        }
        assert_eq!(heap.len(), data.len());

        let mut previous: Option<&Reservation> = None;
        for _ in 0..data.len() {
            let next = heap.extract_min().expect("heap emptied early");
            if let Some(prev) = previous {
                assert!(prev.report_key() <= next.report_key());
            }
            previous = Some(next);
        }
        assert!(heap.extract_min().is_none());
        assert!(heap.is_empty());
    }

    #[test]
    fn equal_keys_are_all_returned() {
        let data: Vec<_> = (0..5)
            .map(|_| res("2025-01-01".into(), "09:00".into()))
            .collect();
        let mut heap = ReportHeap::new();
        for r in &data {
            heap.insert(r).unwrap();
        }
        assert_eq!(heap.drain_sorted().count(), 5);
    }

    #[test]
    fn doctor_does_not_affect_order() {
        let mut a = res("2025-01-01".into(), "10:00".into());
        a.doctor = "aaa".into();
        let mut b = res("2025-01-01".into(), "09:00".into());
        b.doctor = "zzz".into();
        let mut heap = ReportHeap::new();
        heap.insert(&a).unwrap();
        heap.insert(&b).unwrap();
        assert_eq!(heap.peek().unwrap().doctor, "zzz");
    }

    #[test]
    fn bounded_heap_rejects_overflow_without_dropping() {
        let data: Vec<_> = (0..3)
            .map(|i| res("2025-01-01".into(), format!("0{}:00", i)))
            .collect();
        let mut heap = ReportHeap::bounded(2);
        heap.insert(&data[2]).unwrap();
        heap.insert(&data[1]).unwrap();
        assert_eq!(heap.insert(&data[0]), Err(ClinicError::CapacityExceeded(2)));
        assert_eq!(heap.len(), 2);
        let times: Vec<_> = heap.drain_sorted().map(|r| r.time.as_str()).collect();
        assert_eq!(times, vec!["01:00", "02:00"]);
    }
}
