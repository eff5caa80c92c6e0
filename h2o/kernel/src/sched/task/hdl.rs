use alloc::{collections::BTreeMap, sync::Arc};
use core::any::Any;

use lpc_call::{Error, Feature, Handle, Result};

#[derive(Debug, Clone)]
pub struct Object {
    inner: Arc<dyn Any + Send + Sync>,
    feat: Feature,
}

impl Object {
    #[inline]
    pub fn features(&self) -> Feature {
        self.feat
    }

    fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        Arc::clone(&self.inner)
            .downcast::<T>()
            .map_err(|_| Error::EBADF)
    }
}

#[derive(Debug)]
pub struct HandleMap {
    next_id: u32,
    map: BTreeMap<Handle, Object>,
}

impl HandleMap {
    #[inline]
    pub fn new() -> Self {
        HandleMap {
            next_id: 1,
            map: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// # Errors
    ///
    /// Returns `EMFILE` if the handle ids are exhausted.
    #[inline]
    pub fn insert<T: Any + Send + Sync>(&mut self, obj: Arc<T>, feat: Feature) -> Result<Handle> {
        self.insert_object(Object { inner: obj, feat })
    }

    pub fn insert_object(&mut self, obj: Object) -> Result<Handle> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(Error::EMFILE)?;
        let hdl = Handle::new(id);
        let _ret = self.map.insert(hdl, obj);
        debug_assert!(_ret.is_none());
        Ok(hdl)
    }

    fn object(&self, hdl: Handle) -> Result<&Object> {
        hdl.check_null()?;
        self.map.get(&hdl).ok_or(Error::EBADF)
    }

    /// Look up `hdl` as a `T` carrying at least the rights in `need`.
    ///
    /// # Errors
    ///
    /// Returns `EINVAL` for the null handle, `EBADF` if the handle does not
    /// exist or refers to something other than a `T`, and `EPERM` if it lacks
    /// rights.
    pub fn get<T: Any + Send + Sync>(&self, hdl: Handle, need: Feature) -> Result<Arc<T>> {
        let obj = self.object(hdl)?;
        let ret = obj.downcast::<T>()?;
        if obj.feat.contains(need) {
            Ok(ret)
        } else {
            Err(Error::EPERM)
        }
    }

    /// # Errors
    ///
    /// Returns `EPERM` if `feat` is not a subset of the rights of `hdl`.
    pub fn duplicate(&self, hdl: Handle, feat: Feature) -> Result<Object> {
        let obj = self.object(hdl)?;
        if obj.feat.contains(feat) {
            Ok(Object {
                inner: Arc::clone(&obj.inner),
                feat,
            })
        } else {
            Err(Error::EPERM)
        }
    }

    /// Remove `hdl` if it refers to a `T`, returning the object and the
    /// rights the handle carried.
    pub fn remove<T: Any + Send + Sync>(&mut self, hdl: Handle) -> Result<(Arc<T>, Feature)> {
        let obj = self.object(hdl)?;
        let feat = obj.feat;
        let ret = obj.downcast::<T>()?;
        self.map.remove(&hdl);
        Ok((ret, feat))
    }
}

impl Default for HandleMap {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_errors() {
        let mut map = HandleMap::new();
        let hdl = map.insert(Arc::new(1u32), Feature::READ).unwrap();

        assert_eq!(map.get::<u32>(Handle::NULL, Feature::empty()), Err(Error::EINVAL));
        assert_eq!(map.get::<u32>(Handle::new(99), Feature::empty()), Err(Error::EBADF));
        assert_eq!(map.get::<u64>(hdl, Feature::empty()), Err(Error::EBADF));
        assert_eq!(map.get::<u32>(hdl, Feature::WRITE), Err(Error::EPERM));
        assert_eq!(*map.get::<u32>(hdl, Feature::READ).unwrap(), 1);
    }

    #[test]
    fn remove_checks_type() {
        let mut map = HandleMap::new();
        let hdl = map.insert(Arc::new(1u32), Feature::READ).unwrap();

        assert_eq!(map.remove::<u64>(hdl).map(|_| ()), Err(Error::EBADF));
        assert_eq!(map.len(), 1);
        let (obj, feat) = map.remove::<u32>(hdl).unwrap();
        assert_eq!((*obj, feat), (1, Feature::READ));
        assert!(map.is_empty());
        assert_eq!(map.remove::<u32>(hdl).map(|_| ()), Err(Error::EBADF));
    }
}
