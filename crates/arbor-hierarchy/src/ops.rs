//! Guarded mutations: creating, requiring and deleting members.
//!
//! Every operation here resolves its target inside the mutation guard, so a
//! read-only handle fails before anything else happens and writers sharing a
//! synchronizer never interleave.

use arbor_array::{
    array_from_data, create, empty, empty_like, full, full_like, ones, ones_like, zeros,
    zeros_like, Array, ArrayData, ArrayLike, ArrayOptions,
};
use arbor_store::{contains_array, contains_group, init_group, rmdir, DType};
use serde_json::Value;
use tracing::debug;

use crate::error::{HierarchyError, HierarchyResult};
use crate::group::Group;
use crate::node::{classify, NodeKind};

/// Parameters for [`Group::create_dataset`].
#[derive(Clone, Debug)]
pub struct DatasetOptions {
    pub shape: Vec<u64>,
    pub dtype: DType,
    /// Initial contents. Must agree with `shape` and `dtype`.
    pub data: Option<ArrayData>,
    pub array: ArrayOptions,
}

impl DatasetOptions {
    pub fn new(shape: Vec<u64>, dtype: DType) -> Self {
        Self {
            shape,
            dtype,
            data: None,
            array: ArrayOptions::default(),
        }
    }

    /// Options taking shape and dtype from `data`.
    pub fn from_data(data: ArrayData) -> Self {
        Self {
            shape: data.shape().to_vec(),
            dtype: data.dtype(),
            data: Some(data),
            array: ArrayOptions::default(),
        }
    }
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self::new(Vec::new(), DType::Float64)
    }
}

impl Group {
    // ---- Groups ----

    /// Create a sub-group, returning its handle.
    ///
    /// Without `overwrite`, fails if an array or group already occupies the
    /// path. Missing intermediate groups are created.
    pub fn create_group(&self, name: &str, overwrite: bool) -> HierarchyResult<Group> {
        self.write_op(|| {
            let path = self.item_path(name)?;
            init_group(self.store().as_ref(), &path, self.chunk_store_ref(), overwrite)?;
            debug!(path = %path, overwrite, "created group");
            self.open_group_at(path)
        })
    }

    /// Create several sub-groups, one guarded operation each.
    pub fn create_groups(&self, names: &[&str], overwrite: bool) -> HierarchyResult<Vec<Group>> {
        names
            .iter()
            .map(|name| self.create_group(name, overwrite))
            .collect()
    }

    /// Open a sub-group, creating it only if no group exists at the path.
    ///
    /// Idempotent for repeated calls with the same name. `overwrite` applies
    /// only when creation happens, e.g. to replace an array.
    pub fn require_group(&self, name: &str, overwrite: bool) -> HierarchyResult<Group> {
        self.write_op(|| {
            let path = self.item_path(name)?;
            if !contains_group(self.store().as_ref(), &path)? {
                init_group(self.store().as_ref(), &path, self.chunk_store_ref(), overwrite)?;
                debug!(path = %path, "required group created");
            }
            self.open_group_at(path)
        })
    }

    pub fn require_groups(&self, names: &[&str]) -> HierarchyResult<Vec<Group>> {
        names
            .iter()
            .map(|name| self.require_group(name, false))
            .collect()
    }

    // ---- Arrays ----

    /// Create an array, optionally filled from `options.data`.
    pub fn create_dataset(&self, name: &str, options: &DatasetOptions) -> HierarchyResult<Array> {
        self.array_op(name, |loc| -> HierarchyResult<Array> {
            let Some(data) = &options.data else {
                return Ok(create(loc, options.shape.clone(), options.dtype, &options.array)?);
            };
            if data.shape() != options.shape.as_slice() || data.dtype() != options.dtype {
                return Err(HierarchyError::TypeMismatch(format!(
                    "data is {:?} {}, dataset declared {:?} {}",
                    data.shape(),
                    data.dtype(),
                    options.shape,
                    options.dtype
                )));
            }
            Ok(array_from_data(loc, data, &options.array)?)
        })
    }

    /// Open the array at `name` if it is compatible, otherwise create it.
    ///
    /// An existing array must have exactly `shape`. With `exact` its dtype
    /// must equal `dtype`; otherwise the stored dtype must cast safely to it.
    pub fn require_dataset(
        &self,
        name: &str,
        shape: &[u64],
        dtype: DType,
        exact: bool,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.write_op(|| {
            let path = self.item_path(name)?;
            if !contains_array(self.store().as_ref(), &path)? {
                let array = create(&self.array_location(path), shape.to_vec(), dtype, options)?;
                debug!(path = %array.path(), "required dataset created");
                return Ok(array);
            }

            let array = Array::open(self.array_location(path))?;
            if array.shape() != shape {
                return Err(HierarchyError::TypeMismatch(format!(
                    "shape does not match existing array; expected {:?}, got {shape:?}",
                    array.shape()
                )));
            }
            let stored = array.dtype();
            if exact && stored != dtype {
                return Err(HierarchyError::TypeMismatch(format!(
                    "exact dtype {stored} does not match requested {dtype}"
                )));
            }
            if !exact && !stored.can_cast_to(dtype) {
                return Err(HierarchyError::TypeMismatch(format!(
                    "dtype {stored} cannot be safely cast to {dtype}"
                )));
            }
            Ok(array)
        })
    }

    /// Create an array whose fill value defaults to zero.
    pub fn create(
        &self,
        name: &str,
        shape: Vec<u64>,
        dtype: DType,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| create(loc, shape, dtype, options))
    }

    pub fn empty(
        &self,
        name: &str,
        shape: Vec<u64>,
        dtype: DType,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| empty(loc, shape, dtype, options))
    }

    pub fn zeros(
        &self,
        name: &str,
        shape: Vec<u64>,
        dtype: DType,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| zeros(loc, shape, dtype, options))
    }

    pub fn ones(
        &self,
        name: &str,
        shape: Vec<u64>,
        dtype: DType,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| ones(loc, shape, dtype, options))
    }

    pub fn full(
        &self,
        name: &str,
        shape: Vec<u64>,
        dtype: DType,
        fill_value: Value,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| full(loc, shape, dtype, fill_value, options))
    }

    /// Create an array holding `data`.
    pub fn array(
        &self,
        name: &str,
        data: &ArrayData,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| array_from_data(loc, data, options))
    }

    pub fn empty_like(
        &self,
        name: &str,
        template: &dyn ArrayLike,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| empty_like(loc, template, options))
    }

    pub fn zeros_like(
        &self,
        name: &str,
        template: &dyn ArrayLike,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| zeros_like(loc, template, options))
    }

    pub fn ones_like(
        &self,
        name: &str,
        template: &dyn ArrayLike,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| ones_like(loc, template, options))
    }

    pub fn full_like(
        &self,
        name: &str,
        template: &dyn ArrayLike,
        fill_value: Value,
        options: &ArrayOptions,
    ) -> HierarchyResult<Array> {
        self.array_op(name, |loc| full_like(loc, template, fill_value, options))
    }

    /// Store `data` at `name`, replacing whatever was there.
    pub fn set_item(&self, name: &str, data: &ArrayData) -> HierarchyResult<Array> {
        let options = ArrayOptions {
            overwrite: true,
            ..Default::default()
        };
        self.array(name, data, &options)
    }

    // ---- Deletion ----

    /// Remove the group or array at `name` and everything below it.
    pub fn delete(&self, name: &str) -> HierarchyResult<()> {
        self.write_op(|| {
            let path = self.item_path(name)?;
            if classify(self.store().as_ref(), &path)? == NodeKind::Absent {
                return Err(HierarchyError::NotFound(path));
            }
            rmdir(self.store().as_ref(), &path)?;
            if let Some(chunks) = self.chunk_store_ref() {
                rmdir(chunks, &path)?;
            }
            debug!(path = %path, "deleted member");
            Ok(())
        })
    }

    fn array_op<F, E>(&self, name: &str, build: F) -> HierarchyResult<Array>
    where
        F: FnOnce(&arbor_array::ArrayLocation) -> Result<Array, E>,
        HierarchyError: From<E>,
    {
        self.write_op(|| {
            let path = self.item_path(name)?;
            let array = build(&self.array_location(path))?;
            debug!(
                path = %array.path(),
                shape = ?array.shape(),
                dtype = %array.dtype(),
                "created array"
            );
            Ok(array)
        })
    }

    fn chunk_store_ref(&self) -> Option<&dyn arbor_store::Store> {
        self.chunk_store().map(|s| s.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupOptions;
    use crate::open::memory_group;
    use arbor_store::{MemoryStore, Store};
    use arbor_sync::ThreadSynchronizer;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn read_only_view(g: &Group) -> Group {
        Group::open(
            Arc::clone(g.store()),
            g.path(),
            GroupOptions {
                read_only: true,
                ..Default::default()
            },
        )
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    #[test]
    fn fresh_group_classifies_as_group_only() {
        let root = memory_group().unwrap();
        let g = root.create_group("g", false).unwrap();
        assert!(contains_group(root.store().as_ref(), g.path()).unwrap());
        assert!(!contains_array(root.store().as_ref(), g.path()).unwrap());

        let a = root.zeros("a", vec![2], DType::Int16, &Default::default()).unwrap();
        assert!(contains_array(root.store().as_ref(), a.path()).unwrap());
        assert!(!contains_group(root.store().as_ref(), a.path()).unwrap());
    }

    #[test]
    fn intermediate_groups_are_created() {
        let root = memory_group().unwrap();
        let c = root.create_group("a/b/c", false).unwrap();
        assert_eq!(c.path(), "a/b/c");
        for path in ["a", "a/b", "a/b/c"] {
            assert!(root.get(path).unwrap().is_group(), "{path} should be a group");
        }
    }

    #[test]
    fn create_group_over_existing_node() {
        let root = memory_group().unwrap();
        root.create_group("g", false).unwrap();
        assert!(matches!(
            root.create_group("g", false),
            Err(HierarchyError::ContainsGroup(p)) if p == "g"
        ));

        root.zeros("a", vec![1], DType::UInt8, &Default::default()).unwrap();
        assert!(matches!(
            root.create_group("a", false),
            Err(HierarchyError::ContainsArray(_))
        ));
        assert!(root.create_group("a", true).unwrap().path() == "a");
        assert!(root.get("a").unwrap().is_group());
    }

    #[test]
    fn create_group_under_array_fails() {
        let root = memory_group().unwrap();
        root.zeros("a", vec![1], DType::UInt8, &Default::default()).unwrap();
        assert!(matches!(
            root.create_group("a/b", false),
            Err(HierarchyError::ContainsArray(p)) if p == "a"
        ));
    }

    #[test]
    fn overwrite_wipes_existing_subtree() {
        let root = memory_group().unwrap();
        root.create_group("g/inner", false).unwrap();
        root.create_group("g", true).unwrap();
        assert!(!root.contains("g/inner").unwrap());
    }

    #[test]
    fn require_group_is_idempotent() {
        let root = memory_group().unwrap();
        let first = root.require_group("g", false).unwrap();
        first.attrs().set("keep", true).unwrap();
        let second = root.require_group("g", false).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.attrs().get("keep").unwrap(), Some(json!(true)));
    }

    #[test]
    fn require_group_over_array() {
        let root = memory_group().unwrap();
        root.zeros("a", vec![1], DType::UInt8, &Default::default()).unwrap();
        assert!(matches!(
            root.require_group("a", false),
            Err(HierarchyError::ContainsArray(_))
        ));
        assert!(root.require_group("a", true).is_ok());
    }

    #[test]
    fn bulk_group_helpers() {
        let root = memory_group().unwrap();
        let made = root.create_groups(&["x", "y/z"], false).unwrap();
        assert_eq!(made[1].path(), "y/z");
        let again = root.require_groups(&["x", "y/z", "w"]).unwrap();
        assert_eq!(again.len(), 3);
        assert_eq!(again[0], made[0]);
    }

    // -----------------------------------------------------------------------
    // Arrays
    // -----------------------------------------------------------------------

    #[test]
    fn create_dataset_with_and_without_data() {
        let root = memory_group().unwrap();
        let blank = root
            .create_dataset("blank", &DatasetOptions::new(vec![5, 5], DType::Float32))
            .unwrap();
        assert_eq!(blank.shape(), &[5, 5]);

        let data = ArrayData::from_vec(vec![3], vec![1i64, 2, 3]).unwrap();
        let filled = root
            .create_dataset("filled", &DatasetOptions::from_data(data.clone()))
            .unwrap();
        assert_eq!(filled.read_all().unwrap(), data);

        let mut mismatched = DatasetOptions::from_data(data);
        mismatched.dtype = DType::Int32;
        assert!(matches!(
            root.create_dataset("bad", &mismatched),
            Err(HierarchyError::TypeMismatch(_))
        ));
    }

    #[test]
    fn require_dataset_returns_existing_array() {
        let root = memory_group().unwrap();
        let opts = ArrayOptions::default();
        let first = root.require_dataset("d", &[10], DType::Int32, true, &opts).unwrap();
        first.write_all(&ArrayData::from_vec(vec![10], vec![7i32; 10]).unwrap()).unwrap();

        let second = root.require_dataset("d", &[10], DType::Int32, true, &opts).unwrap();
        assert_eq!(first, second);
        // Not re-created: contents survive.
        assert_eq!(second.read_all().unwrap().to_vec::<i32>().unwrap(), vec![7; 10]);
    }

    #[test]
    fn require_dataset_shape_mismatch() {
        let root = memory_group().unwrap();
        let opts = ArrayOptions::default();
        root.require_dataset("d", &[10], DType::Int32, false, &opts).unwrap();
        assert!(matches!(
            root.require_dataset("d", &[11], DType::Int32, false, &opts),
            Err(HierarchyError::TypeMismatch(_))
        ));
    }

    #[test]
    fn require_dataset_dtype_rules() {
        let root = memory_group().unwrap();
        let opts = ArrayOptions::default();
        root.require_dataset("d", &[4], DType::Int16, true, &opts).unwrap();

        // Stored int16 widens safely to int32 and float32.
        assert!(root.require_dataset("d", &[4], DType::Int32, false, &opts).is_ok());
        assert!(root.require_dataset("d", &[4], DType::Float32, false, &opts).is_ok());
        // ...but not when an exact match is demanded.
        assert!(matches!(
            root.require_dataset("d", &[4], DType::Int32, true, &opts),
            Err(HierarchyError::TypeMismatch(_))
        ));
        // Narrowing and sign changes are unsafe.
        assert!(matches!(
            root.require_dataset("d", &[4], DType::Int8, false, &opts),
            Err(HierarchyError::TypeMismatch(_))
        ));
        assert!(matches!(
            root.require_dataset("d", &[4], DType::UInt16, false, &opts),
            Err(HierarchyError::TypeMismatch(_))
        ));
    }

    #[test]
    fn require_dataset_over_group_fails() {
        let root = memory_group().unwrap();
        root.create_group("g", false).unwrap();
        assert!(matches!(
            root.require_dataset("g", &[1], DType::UInt8, false, &ArrayOptions::default()),
            Err(HierarchyError::ContainsGroup(_))
        ));
    }

    #[test]
    fn array_constructors() {
        let root = memory_group().unwrap();
        let opts = ArrayOptions::default();
        let c = root.create("c", vec![2], DType::UInt8, &opts).unwrap();
        let e = root.empty("e", vec![2], DType::UInt8, &opts).unwrap();
        let o = root.ones("o", vec![2], DType::UInt8, &opts).unwrap();
        let f = root.full("f", vec![2], DType::UInt8, json!(9), &opts).unwrap();
        assert_eq!(c.fill_value(), &json!(0));
        assert_eq!(e.fill_value(), &Value::Null);
        assert_eq!(o.read_all().unwrap().to_vec::<u8>().unwrap(), vec![1, 1]);
        assert_eq!(f.read_all().unwrap().to_vec::<u8>().unwrap(), vec![9, 9]);

        let zl = root.zeros_like("zl", &f, &opts).unwrap();
        let ol = root.ones_like("ol", &f, &opts).unwrap();
        let el = root.empty_like("el", &f, &opts).unwrap();
        let fl = root.full_like("fl", &f, json!(3), &opts).unwrap();
        for like in [&zl, &ol, &el, &fl] {
            assert_eq!(like.shape(), f.shape());
            assert_eq!(like.dtype(), f.dtype());
        }
        assert_eq!(fl.fill_value(), &json!(3));
        assert_eq!(root.array_keys().unwrap().count(), 8);
    }

    #[test]
    fn array_from_data_and_set_item() {
        let root = memory_group().unwrap();
        let first = ArrayData::from_vec(vec![2], vec![1.0f32, 2.0]).unwrap();
        let a = root.array("x", &first, &ArrayOptions::default()).unwrap();
        assert_eq!(a.read_all().unwrap(), first);

        assert!(matches!(
            root.array("x", &first, &ArrayOptions::default()),
            Err(HierarchyError::ContainsArray(_))
        ));

        // set_item always replaces.
        let second = ArrayData::from_vec(vec![3], vec![true, false, true]).unwrap();
        let b = root.set_item("x", &second).unwrap();
        assert_eq!(b.dtype(), DType::Bool);
        assert_eq!(b.read_all().unwrap(), second);

        root.create_group("g", false).unwrap();
        assert_eq!(root.set_item("g", &second).unwrap().shape(), &[3]);
    }

    #[test]
    fn relative_and_absolute_creation_from_child() {
        let root = memory_group().unwrap();
        let g = root.create_group("g", false).unwrap();
        let rel = g.zeros("a", vec![1], DType::Int8, &Default::default()).unwrap();
        let abs = g.zeros("/b", vec![1], DType::Int8, &Default::default()).unwrap();
        assert_eq!(rel.path(), "g/a");
        assert_eq!(abs.path(), "b");
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    #[test]
    fn delete_removes_descendants() {
        let root = memory_group().unwrap();
        root.create_group("a/b/c", false).unwrap();
        root.zeros("a/b/c/arr", vec![2], DType::Int8, &Default::default()).unwrap();
        root.create_group("keep", false).unwrap();

        root.delete("a").unwrap();
        assert!(!root.contains("a").unwrap());
        assert!(!root.contains("a/b/c").unwrap());
        assert!(root.contains("keep").unwrap());
        assert!(root.store().keys().unwrap().iter().all(|k| !k.starts_with("a/")));
    }

    #[test]
    fn delete_array_and_missing() {
        let root = memory_group().unwrap();
        let data = ArrayData::from_vec(vec![2], vec![5u8, 6]).unwrap();
        root.array("arr", &data, &ArrayOptions::default()).unwrap();
        root.delete("arr").unwrap();
        assert!(!root.contains("arr").unwrap());
        assert!(matches!(root.delete("arr"), Err(HierarchyError::NotFound(_))));
    }

    #[test]
    fn delete_also_clears_separate_chunk_store() {
        let store = Arc::new(MemoryStore::new());
        let chunks = Arc::new(MemoryStore::new());
        arbor_store::init_group(store.as_ref(), "", None, false).unwrap();
        let root = Group::open(
            store,
            "",
            GroupOptions {
                chunk_store: Some(chunks.clone() as Arc<dyn Store>),
                ..Default::default()
            },
        )
        .unwrap();
        let data = ArrayData::from_vec(vec![2], vec![1u8, 2]).unwrap();
        root.array("arr", &data, &ArrayOptions::default()).unwrap();
        assert!(!chunks.is_empty());
        root.delete("arr").unwrap();
        assert!(chunks.is_empty());
    }

    // -----------------------------------------------------------------------
    // Read-only handles
    // -----------------------------------------------------------------------

    #[test]
    fn read_only_rejects_every_mutation_without_writing() {
        let store = Arc::new(MemoryStore::new());
        arbor_store::init_group(store.as_ref(), "g", None, false).unwrap();
        let rw = Group::open(store.clone(), "", GroupOptions::default()).unwrap();
        let data = ArrayData::from_vec(vec![1], vec![1u8]).unwrap();
        let template = rw.zeros("t", vec![1], DType::UInt8, &Default::default()).unwrap();
        let ro = read_only_view(&rw);
        let before = store.snapshot();
        let opts = ArrayOptions::default();
        let mut mismatched = DatasetOptions::from_data(data.clone());
        mismatched.dtype = DType::Int32;

        let results: Vec<HierarchyResult<()>> = vec![
            ro.create_group("x", false).map(drop),
            ro.create_group("g", true).map(drop),
            ro.require_group("g", false).map(drop),
            ro.create_groups(&["y"], false).map(drop),
            ro.require_groups(&["g"]).map(drop),
            ro.create_dataset("d", &DatasetOptions::new(vec![1], DType::UInt8)).map(drop),
            ro.create_dataset("d", &mismatched).map(drop),
            ro.require_dataset("t", &[1], DType::UInt8, true, &opts).map(drop),
            ro.create("a", vec![1], DType::UInt8, &opts).map(drop),
            ro.empty("a", vec![1], DType::UInt8, &opts).map(drop),
            ro.zeros("a", vec![1], DType::UInt8, &opts).map(drop),
            ro.ones("a", vec![1], DType::UInt8, &opts).map(drop),
            ro.full("a", vec![1], DType::UInt8, json!(1), &opts).map(drop),
            ro.array("a", &data, &opts).map(drop),
            ro.empty_like("a", &template, &opts).map(drop),
            ro.zeros_like("a", &template, &opts).map(drop),
            ro.ones_like("a", &template, &opts).map(drop),
            ro.full_like("a", &template, json!(1), &opts).map(drop),
            ro.set_item("t", &data).map(drop),
            ro.delete("g"),
            ro.attrs().set("k", 1).map_err(Into::into),
        ];
        for (i, result) in results.into_iter().enumerate() {
            assert!(
                matches!(result, Err(HierarchyError::ReadOnly(_))),
                "operation {i} should fail read-only, got {result:?}"
            );
        }

        // Handles reached through a read-only group are read-only too.
        let child = ro.get("t").unwrap().into_array().unwrap();
        assert!(child.read_only());
        assert!(child.write_all(&data).is_err());

        assert_eq!(store.snapshot(), before);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_creates_with_synchronizer_all_land() {
        let store = Arc::new(MemoryStore::new());
        arbor_store::init_group(store.as_ref(), "", None, false).unwrap();
        let options = GroupOptions {
            synchronizer: Some(Arc::new(ThreadSynchronizer::new())),
            ..Default::default()
        };
        let root = Group::open(store, "", options).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let root = root.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        root.require_group(&format!("shared/t{t}/g{i}"), false).unwrap();
                        let name = format!("shared/t{t}/a{i}");
                        root.zeros(&name, vec![2], DType::Int8, &Default::default())
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("writer thread should not panic");
        }

        let shared = root.get("shared").unwrap().into_group().unwrap();
        assert_eq!(shared.len().unwrap(), 8);
        let mut total = 0;
        shared
            .visit(|_| -> std::ops::ControlFlow<()> {
                total += 1;
                std::ops::ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(total, 8 + 8 * 20);
    }
}
