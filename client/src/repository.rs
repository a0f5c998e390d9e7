//! Local id→object caches kept in step with the simulator's id listings.

use crate::error::Result;
use crate::link::Link;
use crate::object::StepListener;
use crate::query::{Dispatcher, FromValue, ReadQuery};
use log::debug;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use wire::constants::ID_LIST;
use wire::ValueType;

/// Builds the local object for an id the simulator just reported
pub trait ObjectFactory<T>: Send + Sync {
    fn create(&self, id: &str) -> Result<Arc<T>>;
}

impl<T, F> ObjectFactory<T> for F
where
    F: Fn(&str) -> Result<Arc<T>> + Send + Sync,
{
    fn create(&self, id: &str) -> Result<Arc<T>> {
        self(id)
    }
}

pub struct Repository<T> {
    name: &'static str,
    id_list: Arc<ReadQuery>,
    objects: Mutex<HashMap<String, Arc<T>>>,
    factory: Box<dyn ObjectFactory<T>>,
    ids_change_each_step: bool,
    forwards_steps: bool,
}

impl<T> Repository<T> {
    /// A repository over the ids listed by the get command `command`
    pub fn new(name: &'static str, command: u8, factory: impl ObjectFactory<T> + 'static) -> Self {
        Self {
            name,
            id_list: Arc::new(ReadQuery::new(command, "", ID_LIST, ValueType::StringList)),
            objects: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
            ids_change_each_step: false,
            forwards_steps: false,
        }
    }

    /// Refetches the id listing after every step
    pub fn with_changing_ids(mut self) -> Self {
        self.ids_change_each_step = true;
        self
    }

    /// Passes the step broadcast on to every cached object
    pub fn forwarding_steps(mut self) -> Self {
        self.forwards_steps = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id_list(&self) -> &Arc<ReadQuery> {
        &self.id_list
    }

    /// Number of objects currently held, without syncing
    pub fn cached_len(&self) -> usize {
        self.objects.lock().len()
    }

    /// Fetches the authoritative id set and brings the local cache in line.
    ///
    /// Objects for new ids are built before anything is evicted; if one of
    /// them cannot be built the cache is left exactly as it was.
    pub fn get_ids<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<Vec<String>> {
        let ids = Vec::<String>::from_value(self.id_list.get(dispatcher)?)?;

        let mut objects = self.objects.lock();
        let mut created: HashMap<String, Arc<T>> = HashMap::new();
        for id in &ids {
            if !objects.contains_key(id) && !created.contains_key(id) {
                created.insert(id.clone(), self.factory.create(id)?);
            }
        }

        let current: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let before = objects.len();
        objects.retain(|id, _| current.contains(id.as_str()));
        let removed = before - objects.len();
        let added = created.len();
        objects.extend(created);

        if added > 0 || removed > 0 {
            debug!(
                "{} repository: {} added, {} removed, {} cached",
                self.name,
                added,
                removed,
                objects.len()
            );
        }
        Ok(ids)
    }

    /// Looks up one object after syncing; an unknown id is `None`
    pub fn get_by_id<L: Link>(
        &self,
        id: &str,
        dispatcher: &Dispatcher<L>,
    ) -> Result<Option<Arc<T>>> {
        self.get_ids(dispatcher)?;
        Ok(self.objects.lock().get(id).cloned())
    }

    pub fn get_all<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<HashMap<String, Arc<T>>> {
        self.get_ids(dispatcher)?;
        Ok(self.objects.lock().clone())
    }
}

impl<T: StepListener> StepListener for Repository<T> {
    fn next_step(&self, time: f64) {
        if self.ids_change_each_step {
            self.id_list.set_obsolete();
        }
        if self.forwards_steps {
            let objects: Vec<Arc<T>> = self.objects.lock().values().cloned().collect();
            for object in objects {
                object.next_step(time);
            }
        }
    }
}
