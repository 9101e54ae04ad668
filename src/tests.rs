//! Shared test code.

include!("../tests/common.rs");

pub(crate) mod writer {
    //! Building table data from a list of typed values.

    #[derive(Clone, Copy)]
    pub enum TtfType {
        FontCollectionMagic,
        Int16(i16),
        UInt16(u16),
        UInt32(u32),
    }

    pub fn convert(values: &[TtfType]) -> Vec<u8> {
        let mut data = Vec::with_capacity(256);
        for v in values {
            convert_type(*v, &mut data);
        }

        data
    }

    fn convert_type(value: TtfType, data: &mut Vec<u8>) {
        match value {
            TtfType::FontCollectionMagic => {
                data.extend_from_slice(b"ttcf");
            }
            TtfType::Int16(n) => {
                data.extend_from_slice(&i16::to_be_bytes(n));
            }
            TtfType::UInt16(n) => {
                data.extend_from_slice(&u16::to_be_bytes(n));
            }
            TtfType::UInt32(n) => {
                data.extend_from_slice(&u32::to_be_bytes(n));
            }
        }
    }
}
