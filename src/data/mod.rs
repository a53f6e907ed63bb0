pub mod geojson;
