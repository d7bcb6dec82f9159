////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::{
    fmt::{Debug, Display, Formatter},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use compact_str::CompactString;

use crate::{
    report::system_panic,
    runtime::{Object, RuntimeResult, RustOrigin, TypeRef, Value},
};

/// A host accessor that reads a property of the target object.
pub type Getter = Arc<dyn Fn(&Object) -> RuntimeResult<Value> + Send + Sync + 'static>;

/// A host accessor that assigns a property of the target object.
pub type Setter = Arc<dyn Fn(&Object, Value) -> RuntimeResult<()> + Send + Sync + 'static>;

/// A host implementation of a method of the target object.
///
/// The engine guarantees that the `arguments` slice has exactly as many
/// values as the method declares parameters, and that each value conforms to
/// the corresponding parameter type.
pub type MethodBody =
    Arc<dyn Fn(&Object, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static>;

/// A process-unique identifier of a [Shape].
///
/// Identifiers are never reused within the process, so a ShapeId can be used
/// as a stable cache key for the lifetime of the process.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ShapeId(u64);

impl Debug for ShapeId {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, formatter)
    }
}

impl Display for ShapeId {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("#{}", self.0))
    }
}

impl ShapeId {
    #[inline(always)]
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);

        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the numeric value of this identifier.
    #[inline(always)]
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

/// The runtime structure of the target objects: the reflective metadata the
/// host program has already loaded for one of its types.
///
/// A Shape consists of the public surface (the member table visible to
/// ordinary lookups) and zero or more explicitly implemented contracts, whose
/// members are reachable only through an
/// [explicit-owner qualifier](crate::duck::DescriptorMember::owner).
///
/// Shapes are immutable once [built](ShapeBuilder::finish). The engine never
/// changes them.
pub struct Shape {
    id: ShapeId,
    name: CompactString,
    origin: &'static RustOrigin,
    surface: MemberTable,
    contracts: Vec<Contract>,
    slots: Vec<TypeRef>,
}

impl Debug for Shape {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Shape")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("surface", &self.surface)
            .field("contracts", &self.contracts)
            .finish()
    }
}

impl Display for Shape {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("{}{}", self.name, self.id))
    }
}

impl Shape {
    /// Starts building a new Shape with the specified type name.
    ///
    /// ```
    /// use tracer_duck::runtime::{Object, Shape, TypeRef};
    ///
    /// let shape = Shape::build("Counter")
    ///     .field("count", TypeRef::I32)
    ///     .property("double", TypeRef::I32, |object| {
    ///         let count = object.get("count")?.take::<i32>()?;
    ///
    ///         Ok((count * 2).into())
    ///     })
    ///     .finish();
    ///
    /// let counter = Object::new(&shape);
    ///
    /// counter.set("count", 3i32).unwrap();
    ///
    /// assert_eq!(counter.get("count").unwrap().take::<i32>().unwrap(), 3);
    /// ```
    #[inline(always)]
    pub fn build(name: impl Into<CompactString>) -> ShapeBuilder {
        ShapeBuilder {
            id: ShapeId::next(),
            name: name.into(),
            origin: RustOrigin::nil(),
            surface: MemberTable::default(),
            contracts: Vec::new(),
            cursor: None,
            slots: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn origin(&self) -> &'static RustOrigin {
        self.origin
    }

    /// The member table visible to lookups without an explicit-owner
    /// qualifier.
    #[inline(always)]
    pub fn surface(&self) -> &MemberTable {
        &self.surface
    }

    /// The explicitly implemented contracts in declaration order.
    #[inline(always)]
    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    /// Looks up an explicitly implemented contract by its exact name.
    #[inline]
    pub fn contract(&self, name: &str) -> Option<&Contract> {
        self.contracts.iter().find(|contract| contract.name == name)
    }

    /// The types of the object storage slots, one per declared field across
    /// the surface and all contracts.
    #[inline(always)]
    pub(crate) fn slots(&self) -> &[TypeRef] {
        &self.slots
    }
}

/// A named member table explicitly implemented by a [Shape].
#[derive(Debug)]
pub struct Contract {
    name: CompactString,
    table: MemberTable,
}

impl Contract {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn table(&self) -> &MemberTable {
        &self.table
    }
}

/// A set of members declared on a [Shape]'s surface or within one of its
/// [contracts](Contract).
///
/// Several members of the same kind may share a name. For methods, this is
/// how overloads are expressed.
#[derive(Default, Debug)]
pub struct MemberTable {
    fields: Vec<FieldMeta>,
    properties: Vec<PropertyMeta>,
    methods: Vec<MethodMeta>,
}

impl MemberTable {
    #[inline(always)]
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    #[inline(always)]
    pub fn properties(&self) -> &[PropertyMeta] {
        &self.properties
    }

    #[inline(always)]
    pub fn methods(&self) -> &[MethodMeta] {
        &self.methods
    }

    #[inline]
    pub(crate) fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// A stored field of the target object.
#[derive(Debug)]
pub struct FieldMeta {
    name: CompactString,
    ty: TypeRef,
    readonly: bool,
    slot: usize,
}

impl FieldMeta {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Returns true if the field cannot be assigned through a proxy.
    #[inline(always)]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    #[inline(always)]
    pub(crate) fn slot(&self) -> usize {
        self.slot
    }
}

/// A computed member of the target object, backed by host accessors.
///
/// A property may have a getter, a setter, or both.
pub struct PropertyMeta {
    name: CompactString,
    ty: TypeRef,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl Debug for PropertyMeta {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PropertyMeta")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("readable", &self.getter.is_some())
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

impl PropertyMeta {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    #[inline(always)]
    pub fn getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    #[inline(always)]
    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }
}

/// An invokable member of the target object.
pub struct MethodMeta {
    name: CompactString,
    params: Vec<TypeRef>,
    output: TypeRef,
    body: MethodBody,
}

impl Debug for MethodMeta {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MethodMeta")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl MethodMeta {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter types. Entries may be
    /// [open generic parameters](TypeRef::Generic).
    #[inline(always)]
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    #[inline(always)]
    pub fn output(&self) -> &TypeRef {
        &self.output
    }

    #[inline(always)]
    pub fn body(&self) -> &MethodBody {
        &self.body
    }
}

/// A builder of the [Shape] object.
///
/// Created by the [Shape::build] function. By default, the builder appends
/// members to the public surface. The [contract](Self::contract) function
/// switches the builder to an explicit contract table, and the
/// [surface](Self::surface) function switches it back.
pub struct ShapeBuilder {
    id: ShapeId,
    name: CompactString,
    origin: &'static RustOrigin,
    surface: MemberTable,
    contracts: Vec<Contract>,
    cursor: Option<usize>,
    slots: Vec<TypeRef>,
}

impl ShapeBuilder {
    /// Returns the identifier of the Shape being built.
    ///
    /// Useful for declaring members that refer to the shape itself through
    /// [TypeRef::Shape].
    #[inline(always)]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    #[inline(always)]
    pub fn origin(mut self, origin: &'static RustOrigin) -> Self {
        self.origin = origin;

        self
    }

    /// Declares an assignable stored field.
    #[inline(always)]
    pub fn field(self, name: impl Into<CompactString>, ty: impl Into<TypeRef>) -> Self {
        self.add_field(name.into(), ty.into(), false)
    }

    /// Declares a stored field that proxies cannot assign.
    #[inline(always)]
    pub fn readonly_field(self, name: impl Into<CompactString>, ty: impl Into<TypeRef>) -> Self {
        self.add_field(name.into(), ty.into(), true)
    }

    /// Declares a read-only property.
    #[inline(always)]
    pub fn property(
        self,
        name: impl Into<CompactString>,
        ty: impl Into<TypeRef>,
        getter: impl Fn(&Object) -> RuntimeResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.property_with(name, ty, Some(Arc::new(getter)), None)
    }

    /// Declares a readable and assignable property.
    #[inline(always)]
    pub fn property_mut(
        self,
        name: impl Into<CompactString>,
        ty: impl Into<TypeRef>,
        getter: impl Fn(&Object) -> RuntimeResult<Value> + Send + Sync + 'static,
        setter: impl Fn(&Object, Value) -> RuntimeResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.property_with(name, ty, Some(Arc::new(getter)), Some(Arc::new(setter)))
    }

    /// Declares a property with an arbitrary set of accessors, including a
    /// write-only property.
    pub fn property_with(
        mut self,
        name: impl Into<CompactString>,
        ty: impl Into<TypeRef>,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Self {
        self.table().properties.push(PropertyMeta {
            name: name.into(),
            ty: ty.into(),
            getter,
            setter,
        });

        self
    }

    /// Declares a method. Methods with the same name but different
    /// parameter lists are overloads.
    pub fn method(
        mut self,
        name: impl Into<CompactString>,
        params: impl IntoIterator<Item = TypeRef>,
        output: impl Into<TypeRef>,
        body: impl Fn(&Object, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.table().methods.push(MethodMeta {
            name: name.into(),
            params: params.into_iter().collect(),
            output: output.into(),
            body: Arc::new(body),
        });

        self
    }

    /// Switches the builder to the explicitly implemented contract with the
    /// specified name, creating the contract on first use.
    pub fn contract(mut self, name: impl Into<CompactString>) -> Self {
        let name = name.into();

        let index = match self
            .contracts
            .iter()
            .position(|contract| contract.name == name)
        {
            Some(index) => index,

            None => {
                self.contracts.push(Contract {
                    name,
                    table: MemberTable::default(),
                });

                self.contracts.len() - 1
            }
        };

        self.cursor = Some(index);

        self
    }

    /// Switches the builder back to the public surface.
    #[inline(always)]
    pub fn surface(mut self) -> Self {
        self.cursor = None;

        self
    }

    /// Finishes the Shape.
    #[inline]
    pub fn finish(self) -> Arc<Shape> {
        Arc::new(Shape {
            id: self.id,
            name: self.name,
            origin: self.origin,
            surface: self.surface,
            contracts: self.contracts,
            slots: self.slots,
        })
    }

    fn add_field(mut self, name: CompactString, ty: TypeRef, readonly: bool) -> Self {
        let slot = self.slots.len();

        self.slots.push(ty);

        self.table().fields.push(FieldMeta {
            name,
            ty,
            readonly,
            slot,
        });

        self
    }

    #[inline]
    fn table(&mut self) -> &mut MemberTable {
        match self.cursor {
            None => &mut self.surface,

            Some(index) => match self.contracts.get_mut(index) {
                Some(contract) => &mut contract.table,
                None => system_panic!("Contract cursor out of bounds."),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Object, Shape, TypeRef, Value};

    #[test]
    fn test_shape_identity() {
        let first = Shape::build("Point").finish();
        let second = Shape::build("Point").finish();

        assert_ne!(first.id(), second.id());
        assert_eq!(first.to_string(), format!("Point{}", first.id()));
    }

    #[test]
    fn test_shape_tables() {
        let shape = Shape::build("Command")
            .field("text", TypeRef::STR)
            .readonly_field("id", TypeRef::I64)
            .method("run", [], TypeRef::Unit, |_, _| Ok(Value::Nil))
            .contract("IDisposable")
            .method("Dispose", [], TypeRef::Unit, |_, _| Ok(Value::Nil))
            .field("disposed", TypeRef::BOOL)
            .surface()
            .property("length", TypeRef::I32, |object| {
                let text = object.get("text")?.take::<String>()?;

                Ok(Value::I32(text.len() as i32))
            })
            .finish();

        assert_eq!(shape.surface().fields().len(), 2);
        assert_eq!(shape.surface().properties().len(), 1);
        assert_eq!(shape.surface().methods().len(), 1);
        assert_eq!(shape.contracts().len(), 1);
        assert!(shape.surface().fields()[1].is_readonly());

        let contract = shape.contract("IDisposable").unwrap();

        assert_eq!(contract.table().methods()[0].name(), "Dispose");
        assert_eq!(contract.table().fields()[0].slot(), 2);
        assert!(shape.contract("IEnumerable").is_none());

        let object = Object::new(&shape);

        object.set("text", "select 1").unwrap();

        let length = (shape.surface().properties()[0].getter().unwrap())(&object).unwrap();

        assert!(matches!(length, Value::I32(8)));
    }
}
