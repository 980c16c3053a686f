//! Generic filter/sort pipeline built on [`DerivedView`].
//!
//! A pipeline is a base collection, an ordered list of filter stages (each
//! bound to one criteria input) and an optional sort stage bound to a sort
//! input. Every recompute starts again from the full base collection, runs the
//! stages in the order they were added and allocates a fresh `Arc<[T]>`.

use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;

use crate::reactive::{DerivedView, GraphError, Signal, Source};

type Stage<T> = Box<dyn Fn(&mut Vec<T>)>;

pub struct FilterSortPipeline<T> {
    base: Box<dyn Fn() -> Arc<[T]>>,
    sources: Vec<Rc<dyn Source>>,
    filters: Vec<Stage<T>>,
    sort: Option<Stage<T>>,
}

impl<T: Clone + 'static> FilterSortPipeline<T> {
    /// Starts a pipeline over `base`.
    pub fn over<S>(base: &S) -> Self
    where
        S: Signal<Arc<[T]>> + Clone + 'static,
    {
        let input = base.clone();
        Self {
            base: Box::new(move || input.get()),
            sources: vec![base.as_source()],
            filters: Vec::new(),
            sort: None,
        }
    }

    /// Appends a filter stage. `keep` sees the criterion's current value and
    /// one item; an inactive criterion should simply keep everything.
    pub fn filter<C, S>(mut self, criterion: &S, keep: impl Fn(&C, &T) -> bool + 'static) -> Self
    where
        S: Signal<C> + Clone + 'static,
    {
        let input = criterion.clone();
        self.add_source(criterion.as_source());
        self.filters.push(Box::new(move |items: &mut Vec<T>| {
            let value = input.get();
            items.retain(|item| keep(&value, item));
        }));
        self
    }

    /// Sets the sort stage. `compare` must be a total order for the output to
    /// be deterministic; the sort itself is stable.
    pub fn sort_by<O, S>(
        mut self,
        order: &S,
        compare: impl Fn(&O, &T, &T) -> Ordering + 'static,
    ) -> Self
    where
        S: Signal<O> + Clone + 'static,
    {
        let input = order.clone();
        self.add_source(order.as_source());
        self.sort = Some(Box::new(move |items: &mut Vec<T>| {
            let value = input.get();
            items.sort_by(|a, b| compare(&value, a, b));
        }));
        self
    }

    fn add_source(&mut self, source: Rc<dyn Source>) {
        // One input may drive several stages; it is still a single upstream.
        if !self
            .sources
            .iter()
            .any(|existing| existing.node_id() == source.node_id())
        {
            self.sources.push(source);
        }
    }

    pub fn build(self) -> Result<DerivedView<Arc<[T]>>, GraphError> {
        let Self {
            base,
            sources,
            filters,
            sort,
        } = self;
        DerivedView::new(sources, move || {
            let mut items: Vec<T> = base().to_vec();
            for stage in &filters {
                stage(&mut items);
            }
            if let Some(sort) = &sort {
                sort(&mut items);
            }
            Arc::from(items)
        })
    }
}
