use std::cmp::Ordering;

use crate::directory::Reservation;

type Link<'a> = Option<Box<Node<'a>>>;

#[derive(Debug)]
struct Node<'a> {
    reservation: &'a Reservation,
    height: i32,
    left: Link<'a>,
    right: Link<'a>,
}

impl<'a> Node<'a> {
    fn leaf(reservation: &'a Reservation) -> Box<Self> {
        Box::new(Node {
            reservation,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn height(link: &Link<'_>) -> i32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn rotate_right(mut node: Box<Node<'_>>) -> Box<Node<'_>> {
    match node.left.take() {
        Some(mut pivot) => {
            node.left = pivot.right.take();
            node.update_height();
            pivot.right = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn rotate_left(mut node: Box<Node<'_>>) -> Box<Node<'_>> {
    match node.right.take() {
        Some(mut pivot) => {
            node.right = pivot.left.take();
            node.update_height();
            pivot.left = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn rebalance(mut node: Box<Node<'_>>) -> Box<Node<'_>> {
    node.update_height();
    let balance = node.balance();

    if balance > 1 {
        // left-right case first turns into left-left
        if node.left.as_ref().is_some_and(|l| l.balance() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|r| r.balance() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

fn insert<'a>(link: Link<'a>, reservation: &'a Reservation, inserted: &mut bool) -> Box<Node<'a>> {
    let mut node = match link {
        None => {
            *inserted = true;
            return Node::leaf(reservation);
        }
        Some(node) => node,
    };

    match reservation.chrono_key().cmp(&node.reservation.chrono_key()) {
        Ordering::Less => node.left = Some(insert(node.left.take(), reservation, inserted)),
        Ordering::Greater => node.right = Some(insert(node.right.take(), reservation, inserted)),
        // same date, time and doctor: treated as already present
        Ordering::Equal => return node,
    }
    rebalance(node)
}

/// One emitted row of a chronological view.
#[derive(Debug, Clone, Copy)]
pub struct ChronoEntry<'a> {
    pub reservation: &'a Reservation,
    /// Set only for doctor-facing views
    pub patient: Option<&'a str>,
}

/// Height-balanced tree that yields borrowed reservations in
/// (date, time, doctor) order. Built per query, then dropped.
#[derive(Debug, Default)]
pub struct ChronoOrderedView<'a> {
    root: Link<'a>,
    len: usize,
}

impl<'a> ChronoOrderedView<'a> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    pub fn from_reservations<I>(reservations: I) -> Self
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        let mut view = Self::new();
        for reservation in reservations {
            view.insert(reservation);
        }
        view
    }

    /// Returns false when an entry with the same key is already present
    pub fn insert(&mut self, reservation: &'a Reservation) -> bool {
        let mut inserted = false;
        self.root = Some(insert(self.root.take(), reservation, &mut inserted));
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn height(&self) -> i32 {
        height(&self.root)
    }

    /// In-order traversal; `include_patient` surfaces the owning patient
    pub fn inorder(&self, include_patient: bool) -> InOrder<'_, 'a> {
        let mut iter = InOrder {
            stack: Vec::new(),
            include_patient,
        };
        iter.push_left(self.root.as_deref());
        iter
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Reservation> + '_ {
        self.inorder(false).map(|entry| entry.reservation)
    }

    /// Checks the height bookkeeping and `|left - right| <= 1` at every node
    pub fn is_balanced(&self) -> bool {
        fn check(link: &Link<'_>) -> Option<i32> {
            match link {
                None => Some(0),
                Some(node) => {
                    let l = check(&node.left)?;
                    let r = check(&node.right)?;
                    let h = 1 + l.max(r);
                    ((l - r).abs() <= 1 && node.height == h).then_some(h)
                }
            }
        }
        check(&self.root).is_some()
    }
}

/// Lazy in-order walk over a [`ChronoOrderedView`]
pub struct InOrder<'t, 'a> {
    stack: Vec<&'t Node<'a>>,
    include_patient: bool,
}

impl<'t, 'a> InOrder<'t, 'a> {
    fn push_left(&mut self, mut node: Option<&'t Node<'a>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'t, 'a> Iterator for InOrder<'t, 'a> {
    type Item = ChronoEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        let reservation = node.reservation;
        Some(ChronoEntry {
            reservation,
            patient: self.include_patient.then_some(reservation.patient.as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn res(date: &str, time: &str, doctor: &str) -> Reservation {
        Reservation {
            date: date.into(),
            time: time.into(),
            doctor: doctor.into(),
            patient: "bob".into(),
            notes: String::new(),
        }
    }

    #[test]
    fn yields_chronological_order_regardless_of_insertion() {
        let data = vec![
            res("2025-03-01", "09:00", "drdoom"),
            res("2025-01-15", "10:00", "drdoom"),
            res("2025-02-20", "08:00", "drdoom"),
        ];
        let view = ChronoOrderedView::from_reservations(&data);
        let dates: Vec<_> = view.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-15", "2025-02-20", "2025-03-01"]);
        assert!(view.is_balanced());
    }

    #[test]
    fn time_then_doctor_break_ties() {
        let data = vec![
            res("2025-01-01", "10:00", "b"),
            res("2025-01-01", "09:00", "z"),
            res("2025-01-01", "10:00", "a"),
        ];
        let view = ChronoOrderedView::from_reservations(&data);
        let keys: Vec<_> = view.iter().map(|r| (r.time.as_str(), r.doctor.as_str())).collect();
        assert_eq!(keys, vec![("09:00", "z"), ("10:00", "a"), ("10:00", "b")]);
    }

    #[test]
    fn exact_key_duplicates_are_collapsed() {
        let mut first = res("2025-01-01", "09:00", "drdoom");
        first.notes = "first".into();
        let mut second = res("2025-01-01", "09:00", "drdoom");
        second.patient = "alice".into();

        let mut view = ChronoOrderedView::new();
        assert!(view.insert(&first));
        assert!(!view.insert(&second));
        assert_eq!(view.len(), 1);
        assert_eq!(view.iter().next().unwrap().notes, "first");
    }

    #[test]
    fn sorted_input_stays_balanced() {
        // ascending input is the worst case for an unbalanced tree
        let data: Vec<_> = (1..=200)
            .map(|i| res(&format!("2025-{:02}-{:02}", i / 28 + 1, i % 28 + 1), "09:00", "d"))
            .collect();
        let view = ChronoOrderedView::from_reservations(&data);
        assert_eq!(view.len(), 200);
        assert!(view.is_balanced());
        // AVL height bound: 1.44 * log2(n + 2)
        assert!(view.height() <= 11, "height {}", view.height());
    }

    #[test]
    fn random_insertion_orders_keep_invariant_and_order() {
        let mut data: Vec<_> = (0..300)
            .map(|i| res("2025-06-01", &format!("{:02}:{:02}", i / 60, i % 60), "d"))
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            data.shuffle(&mut rng);
            let mut view = ChronoOrderedView::new();
            for r in &data {
                view.insert(r);
                assert!(view.is_balanced());
            }
            let out: Vec<_> = view.iter().map(|r| r.chrono_key()).collect();
            let mut expected: Vec<_> = data.iter().map(|r| r.chrono_key()).collect();
            expected.sort();
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn patient_field_only_in_doctor_view() {
        let data = vec![res("2025-01-01", "09:00", "d")];
        let view = ChronoOrderedView::from_reservations(&data);
        assert_eq!(view.inorder(false).next().unwrap().patient, None);
        assert_eq!(view.inorder(true).next().unwrap().patient, Some("bob"));
    }

    #[test]
    fn empty_view() {
        let view = ChronoOrderedView::new();
        assert!(view.is_empty());
        assert_eq!(view.inorder(true).count(), 0);
        assert!(view.is_balanced());
    }
}
