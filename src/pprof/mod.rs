// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Message types for the pprof container format. String-typed fields hold
//! offsets into [Profile::string_table]; object ids are nonzero, with id 0
//! reserved to mean "absent".

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Profile {
    #[prost(message, repeated, tag = "1")]
    pub sample_types: Vec<ValueType>,
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
    #[prost(message, repeated, tag = "4")]
    pub locations: Vec<Location>,
    #[prost(message, repeated, tag = "5")]
    pub functions: Vec<Function>,
    #[prost(string, repeated, tag = "6")]
    pub string_table: Vec<String>,
    #[prost(int64, tag = "9")]
    pub time_nanos: i64,
    #[prost(int64, tag = "10")]
    pub duration_nanos: i64,
    #[prost(message, optional, tag = "11")]
    pub period_type: Option<ValueType>,
    #[prost(int64, tag = "12")]
    pub period: i64,
    #[prost(int64, tag = "14")]
    pub default_sample_type: i64,
}

#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord, ::prost::Message)]
pub struct Sample {
    /// The ids recorded here correspond to a Profile.location.id.
    /// The leaf is at location_ids\[0\].
    #[prost(uint64, repeated, tag = "1")]
    pub location_ids: Vec<u64>,
    /// The type and unit of each value is defined by the corresponding
    /// entry in Profile.sample_types. All samples must have the same
    /// number of values, the same as the length of Profile.sample_types.
    #[prost(int64, repeated, tag = "2")]
    pub values: Vec<i64>,
    /// label includes additional context for this sample. It can include
    /// things like a thread id, allocation size, etc
    #[prost(message, repeated, tag = "3")]
    pub labels: Vec<Label>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, ::prost::Message)]
pub struct ValueType {
    #[prost(int64, tag = "1")]
    pub r#type: i64, // Index into string table
    #[prost(int64, tag = "2")]
    pub unit: i64, // Index into string table
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, ::prost::Message)]
pub struct Label {
    #[prost(int64, tag = "1")]
    pub key: i64, // Index into string table
    #[prost(int64, tag = "2")]
    pub str: i64, // Index into string table
    #[prost(int64, tag = "3")]
    pub num: i64,
    #[prost(int64, tag = "4")]
    pub num_unit: i64, // Index into string table
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Location {
    /// Unique nonzero id for the location.
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "3")]
    pub address: u64,
    #[prost(message, repeated, tag = "4")]
    pub lines: Vec<Line>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, ::prost::Message)]
pub struct Line {
    /// The id of the corresponding Function for this line.
    #[prost(uint64, tag = "1")]
    pub function_id: u64,
    /// Line number in source code.
    #[prost(int64, tag = "2")]
    pub line: i64,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, ::prost::Message)]
pub struct Function {
    /// Unique nonzero id for the function.
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(int64, tag = "2")]
    pub name: i64, // Index into string table
    #[prost(int64, tag = "3")]
    pub system_name: i64, // Index into string table
    #[prost(int64, tag = "4")]
    pub filename: i64, // Index into string table
    #[prost(int64, tag = "5")]
    pub start_line: i64,
}

#[cfg(test)]
impl Profile {
    pub fn string(&self, id: i64) -> &str {
        self.string_table
            .get(id as usize)
            .unwrap_or_else(|| panic!("string {id} not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn basic() {
        let strings: Vec<String> = ["", "samples", "count", "{main}", "index.php", "test"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let main_function = Function {
            id: 1,
            name: 3,
            system_name: 3,
            filename: 4,
            start_line: 0,
        };

        let test_function = Function {
            id: 2,
            name: 5,
            system_name: 5,
            filename: 4,
            start_line: 3,
        };

        let main_location = Location {
            id: 1,
            address: 0,
            lines: vec![Line {
                function_id: main_function.id,
                line: 0,
            }],
        };

        let test_location = Location {
            id: 2,
            address: 0,
            lines: vec![Line {
                function_id: test_function.id,
                line: 4,
            }],
        };

        let profile = Profile {
            sample_types: vec![ValueType { r#type: 1, unit: 2 }],
            samples: vec![
                Sample {
                    location_ids: vec![main_location.id],
                    values: vec![1],
                    labels: vec![],
                },
                Sample {
                    location_ids: vec![test_location.id, main_location.id],
                    values: vec![1],
                    labels: vec![],
                },
            ],
            locations: vec![main_location, test_location],
            functions: vec![main_function, test_function],
            string_table: strings,
            ..Default::default()
        };

        let mut buffer: Vec<u8> = Vec::new();
        profile.encode(&mut buffer).expect("encoding to succeed");

        let decoded = Profile::decode(buffer.as_slice()).expect("decoding to succeed");
        assert_eq!(profile, decoded);
    }
}
