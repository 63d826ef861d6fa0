//! Element, attribute and array names of the hypertree grid document.

pub const DOCUMENT_TYPE: &str = "HyperTreeGrid";

pub const ROOT_ELEMENT: &str = "HyperTreeGrid";
pub const GRID_ELEMENT: &str = "Grid";
pub const TREES_ELEMENT: &str = "Trees";
pub const TREE_ELEMENT: &str = "Tree";
pub const CELL_DATA_ELEMENT: &str = "CellData";

pub const BRANCH_FACTOR: &str = "BranchFactor";
pub const TRANSPOSED_ROOT_INDEXING: &str = "TransposedRootIndexing";
pub const DIMENSIONS: &str = "Dimensions";
pub const NUMBER_OF_VERTICES: &str = "NumberOfVertices";
pub const INTERFACE_NORMALS_NAME: &str = "InterfaceNormalsName";
pub const INTERFACE_INTERCEPTS_NAME: &str = "InterfaceInterceptsName";

pub const TREE_INDEX: &str = "Index";
pub const GLOBAL_OFFSET: &str = "GlobalOffset";

pub const COORDINATE_ARRAYS: [&str; 3] = ["XCoordinates", "YCoordinates", "ZCoordinates"];
pub const DESCRIPTOR: &str = "Descriptor";
pub const MASK: &str = "Mask";
pub const NB_VERTICES_BY_LEVEL: &str = "NbVerticesByLevel";

pub const TREE_IDS: &str = "TreeIds";
pub const DEPTH_PER_TREE: &str = "DepthPerTree";
pub const NUMBER_OF_VERTICES_PER_DEPTH: &str = "NumberOfVerticesPerDepth";
pub const DESCRIPTORS: &str = "Descriptors";

/// Leading bytes of a binary mode file.
pub const BINARY_MAGIC: &[u8; 4] = b"HTG\x01";
