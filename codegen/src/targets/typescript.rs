use crate::type_map::TypeMap;
use protogen_idl::Primitive;

/// 64-bit integers map to `bigint`; everything narrower fits a `number`.
pub fn type_map() -> TypeMap {
    TypeMap::new(
        &[
            (Primitive::I8, "number"),
            (Primitive::U8, "number"),
            (Primitive::I16, "number"),
            (Primitive::U16, "number"),
            (Primitive::I32, "number"),
            (Primitive::U32, "number"),
            (Primitive::I64, "bigint"),
            (Primitive::U64, "bigint"),
            (Primitive::F32, "number"),
            (Primitive::F64, "number"),
            (Primitive::Bool, "boolean"),
            (Primitive::String, "string"),
            (Primitive::Bytes, "Uint8Array"),
        ],
        "{T}[]",
        "Map<{K}, {V}>",
    )
}
