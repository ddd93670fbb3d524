pub mod amass;
pub mod cloudenum;
pub mod dirsearch;
pub mod httpx;
pub mod katana;
pub mod nuclei;
pub mod registry;
pub mod subfinder;
pub mod sublist3r;
pub mod types;
pub mod urlfinder;
pub mod waybackurls;
pub mod waymore;
