//! In-memory switch backend.
//!
//! `SimSwitch` stands in for a real ASIC vendor library: it allocates
//! handles, stores attributes, and enforces the removal-ordering rules a
//! hardware SDK would (a pool cannot be removed while a profile draws from
//! it). Clones share one underlying switch, so the buffer and QoS modules
//! can each own a handle to the same device.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use swsm_sai::{
    BufferApi, BufferPoolAttr, BufferPoolOid, BufferProfileAttr, BufferProfileOid,
    IngressPriorityGroupOid, PortOid, QosApi, QosMapAttr, QosMapOid, QosMapType, QueueOid,
    SaiError, SaiResult, SchedulerAttr, SchedulerOid, TrafficDirection, WredAttr, WredOid,
};

#[derive(Default)]
struct SimState {
    next_oid: u64,
    pools: HashMap<u64, Vec<BufferPoolAttr>>,
    profiles: HashMap<u64, Vec<BufferProfileAttr>>,
    qos_maps: HashMap<u64, Vec<QosMapAttr>>,
    schedulers: HashMap<u64, Vec<SchedulerAttr>>,
    wreds: HashMap<u64, Vec<WredAttr>>,
    queue_profiles: HashMap<u64, u64>,
    pg_profiles: HashMap<u64, u64>,
    port_profile_lists: HashMap<(u64, bool), Vec<u64>>,
    queue_schedulers: HashMap<u64, u64>,
    queue_wreds: HashMap<u64, u64>,
    port_qos_maps: HashMap<(u64, bool), u64>,
}

impl SimState {
    fn allocate(&mut self) -> u64 {
        let oid = self.next_oid;
        self.next_oid += 1;
        oid
    }

    fn pool_in_use(&self, pool: u64) -> bool {
        self.profiles.values().any(|attrs| {
            attrs
                .iter()
                .any(|a| matches!(a, BufferProfileAttr::PoolId(p) if p.as_raw() == pool))
        })
    }

    fn profile_in_use(&self, profile: u64) -> bool {
        self.queue_profiles.values().any(|p| *p == profile)
            || self.pg_profiles.values().any(|p| *p == profile)
            || self
                .port_profile_lists
                .values()
                .any(|list| list.contains(&profile))
    }
}

/// A cloneable handle to one simulated switch.
#[derive(Clone)]
pub struct SimSwitch {
    state: Arc<Mutex<SimState>>,
}

impl SimSwitch {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                next_oid: 0x1000,
                ..SimState::default()
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live objects, across all categories.
    pub fn object_count(&self) -> usize {
        let state = self.lock();
        state.pools.len()
            + state.profiles.len()
            + state.qos_maps.len()
            + state.schedulers.len()
            + state.wreds.len()
    }

    /// The profile currently attached to a queue, if any.
    pub fn queue_profile(&self, queue: QueueOid) -> Option<u64> {
        self.lock().queue_profiles.get(&queue.as_raw()).copied()
    }
}

impl Default for SimSwitch {
    fn default() -> Self {
        Self::new()
    }
}

fn direction_key(direction: TrafficDirection) -> bool {
    matches!(direction, TrafficDirection::Ingress)
}

fn map_kind_key(kind: QosMapType) -> bool {
    matches!(kind, QosMapType::DscpToTc)
}

impl BufferApi for SimSwitch {
    fn create_buffer_pool(&mut self, attrs: &[BufferPoolAttr]) -> SaiResult<BufferPoolOid> {
        let mut state = self.lock();
        let oid = state.allocate();
        state.pools.insert(oid, attrs.to_vec());
        debug!("sim: created buffer pool {oid:#x}");
        BufferPoolOid::from_raw(oid).ok_or_else(|| SaiError::internal("oid allocation wrapped"))
    }

    fn set_buffer_pool_attr(&mut self, pool: BufferPoolOid, attr: BufferPoolAttr) -> SaiResult<()> {
        let mut state = self.lock();
        let attrs = state
            .pools
            .get_mut(&pool.as_raw())
            .ok_or_else(|| SaiError::not_found(format!("buffer pool {:#x}", pool.as_raw())))?;
        attrs.push(attr);
        Ok(())
    }

    fn remove_buffer_pool(&mut self, pool: BufferPoolOid) -> SaiResult<()> {
        let mut state = self.lock();
        if state.pool_in_use(pool.as_raw()) {
            return Err(SaiError::object_in_use(format!(
                "buffer pool {:#x}",
                pool.as_raw()
            )));
        }
        state
            .pools
            .remove(&pool.as_raw())
            .map(|_| ())
            .ok_or_else(|| SaiError::not_found(format!("buffer pool {:#x}", pool.as_raw())))
    }

    fn create_buffer_profile(&mut self, attrs: &[BufferProfileAttr]) -> SaiResult<BufferProfileOid> {
        let mut state = self.lock();
        for attr in attrs {
            if let BufferProfileAttr::PoolId(pool) = attr {
                if !state.pools.contains_key(&pool.as_raw()) {
                    return Err(SaiError::not_found(format!(
                        "buffer pool {:#x}",
                        pool.as_raw()
                    )));
                }
            }
        }
        let oid = state.allocate();
        state.profiles.insert(oid, attrs.to_vec());
        debug!("sim: created buffer profile {oid:#x}");
        BufferProfileOid::from_raw(oid).ok_or_else(|| SaiError::internal("oid allocation wrapped"))
    }

    fn set_buffer_profile_attr(
        &mut self,
        profile: BufferProfileOid,
        attr: BufferProfileAttr,
    ) -> SaiResult<()> {
        let mut state = self.lock();
        let attrs = state
            .profiles
            .get_mut(&profile.as_raw())
            .ok_or_else(|| SaiError::not_found(format!("buffer profile {:#x}", profile.as_raw())))?;
        attrs.push(attr);
        Ok(())
    }

    fn remove_buffer_profile(&mut self, profile: BufferProfileOid) -> SaiResult<()> {
        let mut state = self.lock();
        if state.profile_in_use(profile.as_raw()) {
            return Err(SaiError::object_in_use(format!(
                "buffer profile {:#x}",
                profile.as_raw()
            )));
        }
        state
            .profiles
            .remove(&profile.as_raw())
            .map(|_| ())
            .ok_or_else(|| SaiError::not_found(format!("buffer profile {:#x}", profile.as_raw())))
    }

    fn set_queue_buffer_profile(
        &mut self,
        queue: QueueOid,
        profile: Option<BufferProfileOid>,
    ) -> SaiResult<()> {
        let mut state = self.lock();
        match profile {
            Some(profile) => {
                if !state.profiles.contains_key(&profile.as_raw()) {
                    return Err(SaiError::not_found(format!(
                        "buffer profile {:#x}",
                        profile.as_raw()
                    )));
                }
                state.queue_profiles.insert(queue.as_raw(), profile.as_raw());
            }
            None => {
                state.queue_profiles.remove(&queue.as_raw());
            }
        }
        Ok(())
    }

    fn set_priority_group_buffer_profile(
        &mut self,
        pg: IngressPriorityGroupOid,
        profile: Option<BufferProfileOid>,
    ) -> SaiResult<()> {
        let mut state = self.lock();
        match profile {
            Some(profile) => {
                if !state.profiles.contains_key(&profile.as_raw()) {
                    return Err(SaiError::not_found(format!(
                        "buffer profile {:#x}",
                        profile.as_raw()
                    )));
                }
                state.pg_profiles.insert(pg.as_raw(), profile.as_raw());
            }
            None => {
                state.pg_profiles.remove(&pg.as_raw());
            }
        }
        Ok(())
    }

    fn set_port_buffer_profile_list(
        &mut self,
        port: PortOid,
        direction: TrafficDirection,
        profiles: &[BufferProfileOid],
    ) -> SaiResult<()> {
        let mut state = self.lock();
        for profile in profiles {
            if !state.profiles.contains_key(&profile.as_raw()) {
                return Err(SaiError::not_found(format!(
                    "buffer profile {:#x}",
                    profile.as_raw()
                )));
            }
        }
        let raws = profiles.iter().map(|p| p.as_raw()).collect();
        state
            .port_profile_lists
            .insert((port.as_raw(), direction_key(direction)), raws);
        Ok(())
    }
}

impl QosApi for SimSwitch {
    fn create_qos_map(&mut self, attrs: &[QosMapAttr]) -> SaiResult<QosMapOid> {
        let mut state = self.lock();
        let oid = state.allocate();
        state.qos_maps.insert(oid, attrs.to_vec());
        debug!("sim: created qos map {oid:#x}");
        QosMapOid::from_raw(oid).ok_or_else(|| SaiError::internal("oid allocation wrapped"))
    }

    fn set_qos_map_attr(&mut self, map: QosMapOid, attr: QosMapAttr) -> SaiResult<()> {
        let mut state = self.lock();
        let attrs = state
            .qos_maps
            .get_mut(&map.as_raw())
            .ok_or_else(|| SaiError::not_found(format!("qos map {:#x}", map.as_raw())))?;
        attrs.push(attr);
        Ok(())
    }

    fn remove_qos_map(&mut self, map: QosMapOid) -> SaiResult<()> {
        let mut state = self.lock();
        if state.port_qos_maps.values().any(|m| *m == map.as_raw()) {
            return Err(SaiError::object_in_use(format!(
                "qos map {:#x}",
                map.as_raw()
            )));
        }
        state
            .qos_maps
            .remove(&map.as_raw())
            .map(|_| ())
            .ok_or_else(|| SaiError::not_found(format!("qos map {:#x}", map.as_raw())))
    }

    fn create_scheduler(&mut self, attrs: &[SchedulerAttr]) -> SaiResult<SchedulerOid> {
        let mut state = self.lock();
        let oid = state.allocate();
        state.schedulers.insert(oid, attrs.to_vec());
        debug!("sim: created scheduler {oid:#x}");
        SchedulerOid::from_raw(oid).ok_or_else(|| SaiError::internal("oid allocation wrapped"))
    }

    fn set_scheduler_attr(&mut self, scheduler: SchedulerOid, attr: SchedulerAttr) -> SaiResult<()> {
        let mut state = self.lock();
        let attrs = state
            .schedulers
            .get_mut(&scheduler.as_raw())
            .ok_or_else(|| SaiError::not_found(format!("scheduler {:#x}", scheduler.as_raw())))?;
        attrs.push(attr);
        Ok(())
    }

    fn remove_scheduler(&mut self, scheduler: SchedulerOid) -> SaiResult<()> {
        let mut state = self.lock();
        if state
            .queue_schedulers
            .values()
            .any(|s| *s == scheduler.as_raw())
        {
            return Err(SaiError::object_in_use(format!(
                "scheduler {:#x}",
                scheduler.as_raw()
            )));
        }
        state
            .schedulers
            .remove(&scheduler.as_raw())
            .map(|_| ())
            .ok_or_else(|| SaiError::not_found(format!("scheduler {:#x}", scheduler.as_raw())))
    }

    fn create_wred(&mut self, attrs: &[WredAttr]) -> SaiResult<WredOid> {
        let mut state = self.lock();
        let oid = state.allocate();
        state.wreds.insert(oid, attrs.to_vec());
        debug!("sim: created wred profile {oid:#x}");
        WredOid::from_raw(oid).ok_or_else(|| SaiError::internal("oid allocation wrapped"))
    }

    fn set_wred_attr(&mut self, wred: WredOid, attr: WredAttr) -> SaiResult<()> {
        let mut state = self.lock();
        let attrs = state
            .wreds
            .get_mut(&wred.as_raw())
            .ok_or_else(|| SaiError::not_found(format!("wred {:#x}", wred.as_raw())))?;
        attrs.push(attr);
        Ok(())
    }

    fn remove_wred(&mut self, wred: WredOid) -> SaiResult<()> {
        let mut state = self.lock();
        if state.queue_wreds.values().any(|w| *w == wred.as_raw()) {
            return Err(SaiError::object_in_use(format!(
                "wred {:#x}",
                wred.as_raw()
            )));
        }
        state
            .wreds
            .remove(&wred.as_raw())
            .map(|_| ())
            .ok_or_else(|| SaiError::not_found(format!("wred {:#x}", wred.as_raw())))
    }

    fn set_queue_scheduler(
        &mut self,
        queue: QueueOid,
        scheduler: Option<SchedulerOid>,
    ) -> SaiResult<()> {
        let mut state = self.lock();
        match scheduler {
            Some(scheduler) => {
                if !state.schedulers.contains_key(&scheduler.as_raw()) {
                    return Err(SaiError::not_found(format!(
                        "scheduler {:#x}",
                        scheduler.as_raw()
                    )));
                }
                state
                    .queue_schedulers
                    .insert(queue.as_raw(), scheduler.as_raw());
            }
            None => {
                state.queue_schedulers.remove(&queue.as_raw());
            }
        }
        Ok(())
    }

    fn set_queue_wred(&mut self, queue: QueueOid, wred: Option<WredOid>) -> SaiResult<()> {
        let mut state = self.lock();
        match wred {
            Some(wred) => {
                if !state.wreds.contains_key(&wred.as_raw()) {
                    return Err(SaiError::not_found(format!("wred {:#x}", wred.as_raw())));
                }
                state.queue_wreds.insert(queue.as_raw(), wred.as_raw());
            }
            None => {
                state.queue_wreds.remove(&queue.as_raw());
            }
        }
        Ok(())
    }

    fn set_port_qos_map(
        &mut self,
        port: PortOid,
        kind: QosMapType,
        map: Option<QosMapOid>,
    ) -> SaiResult<()> {
        let mut state = self.lock();
        match map {
            Some(map) => {
                if !state.qos_maps.contains_key(&map.as_raw()) {
                    return Err(SaiError::not_found(format!("qos map {:#x}", map.as_raw())));
                }
                state
                    .port_qos_maps
                    .insert((port.as_raw(), map_kind_key(kind)), map.as_raw());
            }
            None => {
                state.port_qos_maps.remove(&(port.as_raw(), map_kind_key(kind)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pool_removal_ordering() {
        let mut sw = SimSwitch::new();
        let pool = sw
            .create_buffer_pool(&[BufferPoolAttr::Size(1024)])
            .unwrap();
        let profile = sw
            .create_buffer_profile(&[BufferProfileAttr::PoolId(pool)])
            .unwrap();

        // The pool cannot go while the profile draws from it.
        assert!(sw.remove_buffer_pool(pool).is_err());
        sw.remove_buffer_profile(profile).unwrap();
        sw.remove_buffer_pool(pool).unwrap();
        assert_eq!(sw.object_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let mut sw = SimSwitch::new();
        let mut clone = sw.clone();

        let pool = sw.create_buffer_pool(&[]).unwrap();
        assert_eq!(clone.object_count(), 1);
        clone.remove_buffer_pool(pool).unwrap();
        assert_eq!(sw.object_count(), 0);
    }

    #[test]
    fn test_queue_attach_detach() {
        let mut sw = SimSwitch::new();
        let pool = sw.create_buffer_pool(&[]).unwrap();
        let profile = sw
            .create_buffer_profile(&[BufferProfileAttr::PoolId(pool)])
            .unwrap();
        let queue = QueueOid::from_raw(0x42).unwrap();

        sw.set_queue_buffer_profile(queue, Some(profile)).unwrap();
        assert_eq!(sw.queue_profile(queue), Some(profile.as_raw()));
        assert!(sw.remove_buffer_profile(profile).is_err());

        sw.set_queue_buffer_profile(queue, None).unwrap();
        assert_eq!(sw.queue_profile(queue), None);
        sw.remove_buffer_profile(profile).unwrap();
    }
}
