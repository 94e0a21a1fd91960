use crate::type_map::TypeMap;
use protogen_idl::Primitive;

pub fn type_map() -> TypeMap {
    TypeMap::new(
        &[
            (Primitive::I8, "sbyte"),
            (Primitive::U8, "byte"),
            (Primitive::I16, "short"),
            (Primitive::U16, "ushort"),
            (Primitive::I32, "int"),
            (Primitive::U32, "uint"),
            (Primitive::I64, "long"),
            (Primitive::U64, "ulong"),
            (Primitive::F32, "float"),
            (Primitive::F64, "double"),
            (Primitive::Bool, "bool"),
            (Primitive::String, "string"),
            (Primitive::Bytes, "byte[]"),
        ],
        "List<{T}>",
        "Dictionary<{K}, {V}>",
    )
}
