//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, PoisonError};

use chrono::{TimeZone, Utc};
use tokio::sync::{Mutex, MutexGuard};

use crate::api::{DigitalOceanTransport, DropletAction, NewDroplet, TransportFuture};
use crate::domain::{
    Droplet, DropletCreation, DropletStatus, Event, EventStatus, Image, Region, Size, SshKey,
};
use crate::error::{DigitalOceanError, Result};

/// RSA public key generated with `ssh-keygen -t rsa -b 2048`.
pub const SAMPLE_RSA_PUBLIC_KEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAABAQDZMD4baifFMMoZDHfqz2QDX/IOSY7NiTuP5k2n8vVxzc3KEu+yreHgSsrf7Xe1jBBV2W8WBhuTtrtaQS+w+HkrSu0EbUEaP5JcsM5rmkW0zYQHw78aTZIn5VmIFMH9Cqrwk8tJsHyXGCvvZRgISCD8vuGFiMFSAlnAxFsrzWU+jIezhCtmcrVt9xOohzqQpiRlV/Aj8o7FZ28S6tYrbOyLlIJyeQQqRYXkFsfZKxCxif7PWdDWZa8yiK2NQR9IzG7ZHFvxKOyY/d32qkrvEpK6P281Mf7LuL5ljjDCgpkz5aHWPpYBdklhn8Gvofbi+2JPvTG7Lxv/k+VYFxBDkiL5 user@host";

/// DSA public key generated with `ssh-keygen -t dsa`.
pub const SAMPLE_DSA_PUBLIC_KEY: &str = "ssh-dss AAAAB3NzaC1kc3MAAACBAJ2zta4u/d2l+OcouQL2K9cQ0CBnlaInf5VQEfgjCSK1W0eTQubCw1retr/vh0ugKMA8ondmHHjCfZY8WxytRY/sOhdHMoBqaVv4TMSv7uP4fpb9saOX2PzT7Rvh8ePWPyZDgMnpmTQWQ7K4Ixep7kgA2R+LzAatciwRT8TAA1HjAAAAFQDa2JNEKoLrwsyLHsotJbyb2dEquQAAAIBJWFFhOUfmAqHY0EAEIlLgCtuI6U2CMRAZ6ouGMevX6nRr8ncUqKrL2DtCeQ1DBUgRvVgFtLM5OMxsNrmrVQZx4bH+HS9phBuqh4DY0bPP0+jzhhiM3MhgvivKvYjOP0cqHP0UXhxWT7U/d2PNCLgfjL8AfXVn6OwWGSvOWKEvUQAAAIEAlSpmKJBbAp/Xj5iEarERRq1PRyd/TJU09nCL9Oq1XNjttGk1EHrzk7mCtft758MuQO6rOdxHaFByhPXJhSroa93d1wpQ6vyo+OG2lMgMta8NT9myLJIWLmF+xJAhP0dZSShKKT6HxfDXNORuSsQ1zsyKe//eTjusg3ApN02uGog= root@vm";

const FIRST_KEY_ID: i32 = 1000;
const FIRST_IMAGE_ID: i32 = 5000;

/// Builds a droplet with fixed catalog ids (image 1, size 66, region 1).
#[must_use]
pub fn sample_droplet(id: i32, name: &str, status: DropletStatus) -> Droplet {
    Droplet {
        id,
        name: name.to_owned(),
        image_id: 1,
        size_id: 66,
        region_id: 1,
        backups_active: false,
        ip: String::from("1.2.3.4"),
        private_ip: None,
        locked: false,
        status,
        created: Utc
            .with_ymd_and_hms(2014, 1, 13, 20, 53, 8)
            .single()
            .unwrap_or_default(),
    }
}

/// Builds a public Ubuntu image.
#[must_use]
pub fn sample_image(id: i32, name: &str) -> Image {
    Image {
        id,
        name: name.to_owned(),
        distribution: String::from("Ubuntu"),
        public_image: true,
        slug: None,
    }
}

/// Builds the 512MB size.
#[must_use]
pub fn sample_size(id: i32) -> Size {
    Size {
        id,
        name: String::from("512MB"),
        slug: String::from("512mb"),
        memory: 512,
        cpu: 1,
        disk: 20,
        cost_per_hour: String::from("0.00744"),
        cost_per_month: String::from("5.0"),
    }
}

/// Builds the New York 1 region.
#[must_use]
pub fn sample_region(id: i32) -> Region {
    Region {
        id: id.to_string(),
        name: String::from("New York 1"),
        slug: String::from("nyc1"),
    }
}

/// Records a single call made through [`ScriptedTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransportCall {
    /// `list_droplets`.
    ListDroplets,
    /// `get_droplet(id)`.
    GetDroplet(i32),
    /// `create_droplet(request)`.
    CreateDroplet(NewDroplet),
    /// `perform_droplet_action(id, action)`.
    DropletAction(i32, DropletAction),
    /// `list_images`.
    ListImages,
    /// `get_image(id)`.
    GetImage(i32),
    /// `delete_image(id)`.
    DeleteImage(i32),
    /// `transfer_image(id, region_id)`.
    TransferImage(i32, i32),
    /// `list_sizes`.
    ListSizes,
    /// `list_regions`.
    ListRegions,
    /// `list_keys`.
    ListKeys,
    /// `get_key(id)`.
    GetKey(i32),
    /// `create_key(name, public_key)`.
    CreateKey(String, String),
    /// `edit_key(id, public_key)`.
    EditKey(i32, String),
    /// `delete_key(id)`.
    DeleteKey(i32),
    /// `get_event(id)`.
    GetEvent(i32),
}

#[derive(Debug)]
struct State {
    droplets: Vec<Droplet>,
    images: Vec<Image>,
    sizes: Vec<Size>,
    regions: Vec<Region>,
    keys: Vec<SshKey>,
    events: HashMap<i32, VecDeque<EventStatus>>,
    action_events: VecDeque<i32>,
    creations: VecDeque<DropletCreation>,
    next_key_id: i32,
    next_image_id: i32,
    register_snapshots: bool,
    fail_image_deletes: bool,
    calls: Vec<TransportCall>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            droplets: Vec::new(),
            images: Vec::new(),
            sizes: Vec::new(),
            regions: Vec::new(),
            keys: Vec::new(),
            events: HashMap::new(),
            action_events: VecDeque::new(),
            creations: VecDeque::new(),
            next_key_id: FIRST_KEY_ID,
            next_image_id: FIRST_IMAGE_ID,
            register_snapshots: true,
            fail_image_deletes: false,
            calls: Vec::new(),
        }
    }
}

impl State {
    fn next_action_event(&mut self, what: &str) -> Result<i32> {
        self.action_events.pop_front().ok_or_else(|| {
            DigitalOceanError::Provider(format!("no scripted event id for {what}"))
        })
    }

    fn next_event_status(&mut self, id: i32) -> Result<EventStatus> {
        let queue = self
            .events
            .get_mut(&id)
            .ok_or_else(|| DigitalOceanError::NotFound(format!("event {id}")))?;
        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().copied()
        };
        status.ok_or_else(|| DigitalOceanError::NotFound(format!("event {id}")))
    }
}

/// In-memory [`DigitalOceanTransport`] with scripted responses.
///
/// Catalog entries are seeded up front. Event statuses are consumed in FIFO
/// order per event id and the last status repeats once the queue drains.
/// Droplet actions and image transfers consume scripted event ids in FIFO
/// order. A snapshot with a name registers a private image under that name
/// unless [`ScriptedTransport::skip_snapshot_registration`] was called.
/// Every call is logged for assertions.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    state: Arc<std::sync::Mutex<State>>,
}

impl ScriptedTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, apply: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state)
    }

    fn record<T>(&self, call: TransportCall, apply: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        self.with_state(|state| {
            state.calls.push(call);
            apply(state)
        })
    }

    /// Seeds a droplet.
    #[must_use]
    pub fn with_droplet(self, droplet: Droplet) -> Self {
        self.with_state(|state| state.droplets.push(droplet));
        self
    }

    /// Seeds an image.
    #[must_use]
    pub fn with_image(self, image: Image) -> Self {
        self.with_state(|state| state.images.push(image));
        self
    }

    /// Seeds a size.
    #[must_use]
    pub fn with_size(self, size: Size) -> Self {
        self.with_state(|state| state.sizes.push(size));
        self
    }

    /// Seeds a region.
    #[must_use]
    pub fn with_region(self, region: Region) -> Self {
        self.with_state(|state| state.regions.push(region));
        self
    }

    /// Seeds a registered SSH key.
    #[must_use]
    pub fn with_key(self, key: SshKey) -> Self {
        self.with_state(|state| state.keys.push(key));
        self
    }

    /// Scripts the statuses returned for `event_id`, in order.
    pub fn script_event(&self, event_id: i32, statuses: impl IntoIterator<Item = EventStatus>) {
        self.with_state(|state| {
            state.events.insert(event_id, statuses.into_iter().collect());
        });
    }

    /// Queues the response to the next droplet creation.
    pub fn push_creation(&self, id: i32, event_id: i32) {
        self.with_state(|state| state.creations.push_back(DropletCreation { id, event_id }));
    }

    /// Queues the event id returned by the next droplet action or transfer.
    pub fn push_action_event(&self, event_id: i32) {
        self.with_state(|state| state.action_events.push_back(event_id));
    }

    /// Makes every image deletion fail with a provider error.
    pub fn fail_image_deletes(&self) {
        self.with_state(|state| state.fail_image_deletes = true);
    }

    /// Stops snapshots from registering images.
    pub fn skip_snapshot_registration(&self) {
        self.with_state(|state| state.register_snapshots = false);
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.with_state(|state| state.calls.clone())
    }

    /// Counts the fetches of `event_id`.
    #[must_use]
    pub fn event_fetches(&self, event_id: i32) -> usize {
        self.with_state(|state| {
            state
                .calls
                .iter()
                .filter(|call| **call == TransportCall::GetEvent(event_id))
                .count()
        })
    }

    /// Returns the currently registered keys.
    #[must_use]
    pub fn keys(&self) -> Vec<SshKey> {
        self.with_state(|state| state.keys.clone())
    }

    /// Returns the currently known images.
    #[must_use]
    pub fn images(&self) -> Vec<Image> {
        self.with_state(|state| state.images.clone())
    }
}

fn ready<T>(result: Result<T>) -> TransportFuture<'static, T>
where
    T: Send + 'static,
{
    Box::pin(std::future::ready(result))
}

impl DigitalOceanTransport for ScriptedTransport {
    fn list_droplets(&self) -> TransportFuture<'_, Vec<Droplet>> {
        ready(self.record(TransportCall::ListDroplets, |state| {
            Ok(state.droplets.clone())
        }))
    }

    fn get_droplet(&self, id: i32) -> TransportFuture<'_, Option<Droplet>> {
        ready(self.record(TransportCall::GetDroplet(id), |state| {
            Ok(state.droplets.iter().find(|droplet| droplet.id == id).cloned())
        }))
    }

    fn create_droplet<'a>(
        &'a self,
        request: &'a NewDroplet,
    ) -> TransportFuture<'a, DropletCreation> {
        ready(self.record(TransportCall::CreateDroplet(request.clone()), |state| {
            state
                .creations
                .pop_front()
                .ok_or_else(|| DigitalOceanError::Provider(String::from("no scripted creation")))
        }))
    }

    fn perform_droplet_action<'a>(
        &'a self,
        id: i32,
        action: &'a DropletAction,
    ) -> TransportFuture<'a, i32> {
        ready(self.record(TransportCall::DropletAction(id, action.clone()), |state| {
            let event_id = state.next_action_event(action.path_segment())?;
            if let DropletAction::Snapshot { name: Some(name) } = action {
                if state.register_snapshots {
                    let image_id = state.next_image_id;
                    state.next_image_id = image_id.saturating_add(1);
                    state.images.push(Image {
                        public_image: false,
                        ..sample_image(image_id, name)
                    });
                }
            }
            Ok(event_id)
        }))
    }

    fn list_images(&self) -> TransportFuture<'_, Vec<Image>> {
        ready(self.record(TransportCall::ListImages, |state| Ok(state.images.clone())))
    }

    fn get_image(&self, id: i32) -> TransportFuture<'_, Option<Image>> {
        ready(self.record(TransportCall::GetImage(id), |state| {
            Ok(state.images.iter().find(|image| image.id == id).cloned())
        }))
    }

    fn delete_image(&self, id: i32) -> TransportFuture<'_, ()> {
        ready(self.record(TransportCall::DeleteImage(id), |state| {
            if state.fail_image_deletes {
                return Err(DigitalOceanError::Provider(String::from("image is in use")));
            }
            let before = state.images.len();
            state.images.retain(|image| image.id != id);
            if state.images.len() == before {
                return Err(DigitalOceanError::NotFound(format!("image {id}")));
            }
            Ok(())
        }))
    }

    fn transfer_image(&self, id: i32, region_id: i32) -> TransportFuture<'_, i32> {
        ready(self.record(TransportCall::TransferImage(id, region_id), |state| {
            state.next_action_event("transfer")
        }))
    }

    fn list_sizes(&self) -> TransportFuture<'_, Vec<Size>> {
        ready(self.record(TransportCall::ListSizes, |state| Ok(state.sizes.clone())))
    }

    fn list_regions(&self) -> TransportFuture<'_, Vec<Region>> {
        ready(self.record(TransportCall::ListRegions, |state| {
            Ok(state.regions.clone())
        }))
    }

    fn list_keys(&self) -> TransportFuture<'_, Vec<SshKey>> {
        ready(self.record(TransportCall::ListKeys, |state| Ok(state.keys.clone())))
    }

    fn get_key(&self, id: i32) -> TransportFuture<'_, Option<SshKey>> {
        ready(self.record(TransportCall::GetKey(id), |state| {
            Ok(state.keys.iter().find(|key| key.id == id).cloned())
        }))
    }

    fn create_key<'a>(
        &'a self,
        name: &'a str,
        public_key: &'a str,
    ) -> TransportFuture<'a, SshKey> {
        let call = TransportCall::CreateKey(name.to_owned(), public_key.to_owned());
        ready(self.record(call, |state| {
            let decoded = crate::ssh::decode(public_key)?;
            let key = SshKey {
                id: state.next_key_id,
                name: name.to_owned(),
                public_key: Some(decoded),
            };
            state.next_key_id = state.next_key_id.saturating_add(1);
            state.keys.push(key.clone());
            Ok(key)
        }))
    }

    fn edit_key<'a>(&'a self, id: i32, public_key: &'a str) -> TransportFuture<'a, SshKey> {
        ready(self.record(TransportCall::EditKey(id, public_key.to_owned()), |state| {
            let decoded = crate::ssh::decode(public_key)?;
            let key = state
                .keys
                .iter_mut()
                .find(|key| key.id == id)
                .ok_or_else(|| DigitalOceanError::NotFound(format!("ssh key {id}")))?;
            key.public_key = Some(decoded);
            Ok(key.clone())
        }))
    }

    fn delete_key(&self, id: i32) -> TransportFuture<'_, ()> {
        ready(self.record(TransportCall::DeleteKey(id), |state| {
            let before = state.keys.len();
            state.keys.retain(|key| key.id != id);
            if state.keys.len() == before {
                return Err(DigitalOceanError::NotFound(format!("ssh key {id}")));
            }
            Ok(())
        }))
    }

    fn get_event(&self, id: i32) -> TransportFuture<'_, Event> {
        ready(self.record(TransportCall::GetEvent(id), |state| {
            let status = state.next_event_status(id)?;
            Ok(Event {
                id,
                status,
                droplet: None,
                action: None,
                percentage: None,
            })
        }))
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and cleans up variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
